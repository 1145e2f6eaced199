//! Banded predictions for corners, cards, shots and shots on target, driven by the dominance
//! signal and the referee's strictness.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::domain::{RangePrediction, Strictness};
use crate::estimator::Bpa;

/// Dominance above which the home side is expected to concede fewer fouls than the visitors.
const DOMINANCE_THRESHOLD: f64 = 0.05;

const SHOTS_ON_TARGET_RATIO: f64 = 0.35;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatMarkets {
    pub corners: RangePrediction,
    pub cards: RangePrediction,
    pub shots: RangePrediction,
    pub shots_on_target: RangePrediction,
}

/// Additive adjustment to each side's expected bookings.
pub fn referee_factor(strictness: Option<Strictness>) -> f64 {
    match strictness {
        Some(Strictness::High) => 2.0,
        Some(Strictness::Low) => -1.5,
        Some(Strictness::Medium) | None => 0.0,
    }
}

pub fn predict(bpa: &Bpa, strictness: Option<Strictness>) -> StatMarkets {
    let dominance = bpa.dominance();
    let referee = referee_factor(strictness);

    let corners = (
        (5.5 + dominance * 18.0).trunc(),
        (4.5 - dominance * 12.0).trunc(),
    );
    let (home_booking_shift, away_booking_shift) = if dominance > DOMINANCE_THRESHOLD {
        (-1.0, 1.5)
    } else {
        (1.0, -0.5)
    };
    let cards = (
        f64::max(0.0, 2.0 + referee + home_booking_shift),
        f64::max(0.0, 2.5 + referee + away_booking_shift),
    );
    let shots = (
        (12.0 + dominance * 40.0).trunc(),
        (10.0 - dominance * 30.0).trunc(),
    );
    let shots_on_target = (
        (shots.0 * SHOTS_ON_TARGET_RATIO).trunc(),
        (shots.1 * SHOTS_ON_TARGET_RATIO).trunc(),
    );

    StatMarkets {
        corners: RangePrediction::Split {
            home: band(corners.0, 1.5, 2.0, 2),
            away: band(corners.1, 1.5, 2.0, 1),
        },
        cards: RangePrediction::Split {
            home: band(cards.0, 1.0, 1.0, 0),
            away: band(cards.1, 1.0, 1.0, 0),
        },
        shots: RangePrediction::Split {
            home: band(shots.0, 3.0, 4.0, 4),
            away: band(shots.1, 3.0, 4.0, 3),
        },
        shots_on_target: RangePrediction::Split {
            home: band(shots_on_target.0, 1.0, 2.0, 1),
            away: band(shots_on_target.1, 1.0, 2.0, 1),
        },
    }
}

/// `[max(floor, centre − below), centre + above]`, truncated to whole counts. The upper end never
/// falls below the lower.
fn band(centre: f64, below: f64, above: f64, floor: u16) -> RangeInclusive<u16> {
    let lower = u16::max(floor, to_count(centre - below));
    let upper = u16::max(lower, to_count(centre + above));
    lower..=upper
}

#[inline]
fn to_count(value: f64) -> u16 {
    value.trunc().clamp(0.0, u16::MAX as f64) as u16
}

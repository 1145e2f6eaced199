//! Closes the loop between estimates and realised results: scores each prediction, nudges the
//! bias factors of under-estimated teams and reconciles the stat-market bands.

use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use strum_macros::Display as StrumDisplay;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::CalibrationConfig;
use crate::display::DisplayRangeInclusive;
use crate::domain::{InvalidInput, OutcomeEstimate, RangePrediction, RealizedOutcome, Site, Winner};
use crate::store::{BiasFactorStore, HistoryEntry, StoreError};

/// Probability at or below which a side counts as under-estimated when it goes on to win.
const UNDERESTIMATE_CEILING: f64 = 0.5;

/// The side called by an estimate: home if its probability exceeds `threshold`, otherwise away if
/// that exceeds it, otherwise a draw.
pub fn predicted_winner(estimate: &OutcomeEstimate, threshold: f64) -> Winner {
    if estimate.home_win > threshold {
        Winner::Home
    } else if estimate.away_win > threshold {
        Winner::Away
    } else {
        Winner::Draw
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub team: String,
    pub site: Site,
    pub delta: f64,
    pub factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationReport {
    pub match_id: String,
    pub predicted: Winner,
    pub actual: Winner,
    pub adjustment: Option<Adjustment>,
}
impl CalibrationReport {
    pub fn success(&self) -> bool {
        self.predicted == self.actual
    }
}

impl Display for CalibrationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "🔄 processing result: {}", self.match_id)?;
        if self.success() {
            return write!(f, "✅ hit: correctly predicted {}", self.actual);
        }
        writeln!(f, "❌ miss: predicted {} vs actual {}", self.predicted, self.actual)?;
        match (&self.adjustment, self.actual) {
            (Some(adjustment), _) => write!(
                f,
                "📈 {} ({}) under-estimated; factor {:+} to {}",
                adjustment.team, adjustment.site, adjustment.delta, adjustment.factor
            ),
            (None, Winner::Draw) => write!(f, "⚠️ draw; no factors adjusted"),
            (None, _) => write!(f, "no factors adjusted"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("invalid result: {0}")]
    InvalidInput(#[from] InvalidInput),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug)]
pub struct OutcomeCalibrator<S> {
    config: CalibrationConfig,
    store: S,
}
impl<S: BiasFactorStore> OutcomeCalibrator<S> {
    pub fn new(config: CalibrationConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn predicted_winner(&self, estimate: &OutcomeEstimate) -> Winner {
        predicted_winner(estimate, self.config.winner_threshold)
    }

    /// Scores the estimate against the realised outcome, logging the result to the store. A missed
    /// home or away win raises the winning team's factor for that site; a missed draw adjusts
    /// nothing. The factor and the history entry are persisted together with a single flush.
    pub fn process_result(
        &mut self,
        estimate: &OutcomeEstimate,
        realized: &RealizedOutcome,
        home_team: &str,
        away_team: &str,
    ) -> Result<CalibrationReport, CalibrationError> {
        if realized.match_id.trim().is_empty() {
            return Err(InvalidInput::MissingMatchId.into());
        }
        if home_team.trim().is_empty() || away_team.trim().is_empty() {
            return Err(InvalidInput::MissingTeamName.into());
        }

        let predicted = self.predicted_winner(estimate);
        let actual = realized.winner;
        let mut report = CalibrationReport {
            match_id: realized.match_id.clone(),
            predicted,
            actual,
            adjustment: None,
        };

        let underestimated = if report.success() {
            None
        } else {
            match actual {
                Winner::Home if estimate.home_win < UNDERESTIMATE_CEILING => Some((home_team, Site::Home)),
                Winner::Away if estimate.away_win < UNDERESTIMATE_CEILING => Some((away_team, Site::Away)),
                _ => None,
            }
        };
        let entry = if report.success() {
            HistoryEntry::now(&realized.match_id, true, "correct winner prediction")
        } else {
            HistoryEntry::now(
                &realized.match_id,
                false,
                format!("missed winner: {predicted} != {actual}"),
            )
        };
        let delta = self.config.bias_step;
        let factor = self.store.update(|state| {
            let factor = underestimated.map(|(team, site)| state.adjust(team, site, delta));
            state.append_log(entry);
            factor
        })?;

        if let (Some((team, site)), Some(factor)) = (underestimated, factor) {
            info!("{team} under-estimated at {site}; factor now {factor}");
            report.adjustment = Some(Adjustment {
                team: team.to_owned(),
                site,
                delta,
                factor,
            });
        }
        debug!("calibrated {}: {report:?}", realized.match_id);
        Ok(report)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, StrumDisplay)]
pub enum Market {
    #[strum(serialize = "Winner (1X2)")]
    Winner,
    Corners,
    Cards,
    Shots,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, StrumDisplay)]
pub enum Status {
    #[strum(serialize = "🟢 HIT")]
    Hit,
    #[strum(serialize = "🔴 MISS")]
    Miss,
    #[strum(serialize = "⚪ N/A")]
    NotAvailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub market: Market,
    pub predicted: String,
    pub actual: String,
    pub status: Status,
}

fn range_row(market: Market, band: &RangeInclusive<u16>, actual: u16) -> ComparisonRow {
    ComparisonRow {
        market,
        predicted: DisplayRangeInclusive::from(band).to_string(),
        actual: actual.to_string(),
        status: if band.contains(&actual) { Status::Hit } else { Status::Miss },
    }
}

/// Reconciles a free-text band, such as `"8-10"` or `"🏠 4-6 | ✈️ 3-5"`, against a realised total.
/// Text without numbers is reported as not available.
pub fn compare_range_text(market: Market, text: &str, actual: u16) -> ComparisonRow {
    match RangePrediction::parse_lenient(text) {
        Some(prediction) => range_row(market, &prediction.total(), actual),
        None => ComparisonRow {
            market,
            predicted: text.to_owned(),
            actual: actual.to_string(),
            status: Status::NotAvailable,
        },
    }
}

/// Hit/miss table over the winner and the stat markets, with split bands compared as match totals.
pub fn generate_comparison_report(
    estimate: &OutcomeEstimate,
    realized: &RealizedOutcome,
    winner_threshold: f64,
) -> Vec<ComparisonRow> {
    let predicted = predicted_winner(estimate, winner_threshold);
    vec![
        ComparisonRow {
            market: Market::Winner,
            predicted: predicted.to_string(),
            actual: realized.winner.to_string(),
            status: if predicted == realized.winner { Status::Hit } else { Status::Miss },
        },
        range_row(Market::Corners, &estimate.corners.total(), realized.corners.total()),
        range_row(Market::Cards, &estimate.cards.total(), realized.cards.total()),
        range_row(Market::Shots, &estimate.shots.total(), realized.shots.total()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PerSide, Score};
    use crate::store::{JsonFileStore, MemoryStore, Stats};

    fn estimate(home_win: f64, draw: f64, away_win: f64) -> OutcomeEstimate {
        OutcomeEstimate {
            match_id: "m1".into(),
            home_lambda: 1.5,
            away_lambda: 1.1,
            home_win,
            draw,
            away_win,
            expected_total_goals: 2.6,
            both_teams_to_score: 0.5,
            most_likely_score: Score::new(1, 1),
            corners: RangePrediction::Split { home: 4..=6, away: 3..=5 },
            cards: RangePrediction::Total(3..=5),
            shots: RangePrediction::Split { home: 9..=16, away: 7..=14 },
            shots_on_target: RangePrediction::Split { home: 3..=6, away: 2..=5 },
            confidence: f64::max(home_win, f64::max(draw, away_win)),
        }
    }

    fn realized(home: u8, away: u8) -> RealizedOutcome {
        RealizedOutcome::from_score("m1", Score::new(home, away))
    }

    fn calibrator() -> OutcomeCalibrator<MemoryStore> {
        OutcomeCalibrator::new(CalibrationConfig::default(), MemoryStore::default())
    }

    #[test]
    fn winner_thresholds() {
        assert_eq!(Winner::Home, predicted_winner(&estimate(0.46, 0.3, 0.24), 0.45));
        assert_eq!(Winner::Draw, predicted_winner(&estimate(0.45, 0.3, 0.25), 0.45));
        assert_eq!(Winner::Away, predicted_winner(&estimate(0.2, 0.3, 0.5), 0.45));
        assert_eq!(Winner::Draw, predicted_winner(&estimate(0.4, 0.2, 0.4), 0.45));
        assert_eq!(Winner::Home, predicted_winner(&estimate(0.4, 0.2, 0.4), 0.35));
    }

    #[test]
    fn hit_leaves_factors_alone() {
        let mut calibrator = calibrator();
        for _ in 0..5 {
            let report = calibrator
                .process_result(&estimate(0.6, 0.25, 0.15), &realized(2, 0), "Rovers", "United")
                .unwrap();
            assert!(report.success());
            assert_eq!(None, report.adjustment);
        }
        assert!(calibrator.store().factors().is_empty());
        assert_eq!(Stats { total: 5, hits: 5, misses: 0 }, calibrator.store().stats());
    }

    #[test]
    fn missed_home_win_raises_home_factor() {
        let mut calibrator = calibrator();
        let report = calibrator
            .process_result(&estimate(0.3, 0.3, 0.4), &realized(1, 0), "Rovers", "United")
            .unwrap();
        assert!(!report.success());
        assert_eq!(Winner::Draw, report.predicted);
        assert_eq!(
            Some(Adjustment { team: "Rovers".into(), site: Site::Home, delta: 0.02, factor: 0.02 }),
            report.adjustment
        );
        assert_eq!(0.02, calibrator.store().get("Rovers", Site::Home));
        assert_eq!(0.0, calibrator.store().get("United", Site::Away));
        assert_eq!(Stats { total: 1, hits: 0, misses: 1 }, calibrator.store().stats());
        assert_eq!("missed winner: EMPATE != LOCAL", calibrator.store().history()[0].detail);
    }

    #[test]
    fn missed_away_win_raises_away_factor() {
        let mut calibrator = calibrator();
        calibrator
            .process_result(&estimate(0.5, 0.3, 0.2), &realized(0, 2), "Rovers", "United")
            .unwrap();
        calibrator
            .process_result(&estimate(0.5, 0.3, 0.2), &realized(1, 3), "Rovers", "United")
            .unwrap();
        assert_eq!(0.04, calibrator.store().get("United", Site::Away));
        assert_eq!(0.0, calibrator.store().get("Rovers", Site::Home));
    }

    #[test]
    fn missing_identities_are_rejected_before_the_store() {
        let mut calibrator = calibrator();
        let result = calibrator.process_result(
            &estimate(0.3, 0.3, 0.4),
            &RealizedOutcome::from_score("", Score::new(1, 0)),
            "Rovers",
            "United",
        );
        assert!(
            matches!(result, Err(CalibrationError::InvalidInput(InvalidInput::MissingMatchId))),
            "{result:?}"
        );

        for (home_team, away_team) in [("", "United"), ("Rovers", " ")] {
            let result = calibrator.process_result(&estimate(0.3, 0.3, 0.4), &realized(1, 0), home_team, away_team);
            assert!(
                matches!(result, Err(CalibrationError::InvalidInput(InvalidInput::MissingTeamName))),
                "{result:?}"
            );
        }
        assert!(calibrator.store().factors().is_empty());
        assert_eq!(Stats::default(), calibrator.store().stats());
    }

    #[test]
    fn failed_flush_persists_neither_factor_nor_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bias_factors.json");
        let store = JsonFileStore::open(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        let mut calibrator = OutcomeCalibrator::new(CalibrationConfig::default(), store);
        let result = calibrator.process_result(&estimate(0.3, 0.3, 0.4), &realized(1, 0), "Rovers", "United");
        assert!(matches!(result, Err(CalibrationError::Store(StoreError::Write { .. }))), "{result:?}");
        assert!(calibrator.store().factors().is_empty());
        assert!(calibrator.store().history().is_empty());
        assert_eq!(Stats::default(), calibrator.store().stats());
    }

    #[test]
    fn missed_draw_adjusts_nothing() {
        let mut calibrator = calibrator();
        let report = calibrator
            .process_result(&estimate(0.55, 0.25, 0.2), &realized(1, 1), "Rovers", "United")
            .unwrap();
        assert!(!report.success());
        assert_eq!(None, report.adjustment);
        assert!(calibrator.store().factors().is_empty());
        assert_eq!(1, calibrator.store().stats().misses);
        assert!(report.to_string().contains("no factors adjusted"));
    }

    #[test]
    fn report_text() {
        let mut calibrator = calibrator();
        let hit = calibrator
            .process_result(&estimate(0.6, 0.25, 0.15), &realized(2, 1), "Rovers", "United")
            .unwrap();
        assert_eq!("🔄 processing result: m1\n✅ hit: correctly predicted LOCAL", hit.to_string());

        let miss = calibrator
            .process_result(&estimate(0.6, 0.25, 0.15), &realized(0, 1), "Rovers", "United")
            .unwrap();
        assert_eq!(
            "🔄 processing result: m1\n❌ miss: predicted LOCAL vs actual VISITANTE\n📈 United (VISITANTE) under-estimated; factor +0.02 to 0.02",
            miss.to_string()
        );
    }

    #[test]
    fn comparison_report() {
        let mut outcome = realized(2, 1);
        outcome.corners = PerSide::new(6, 4);
        outcome.cards = PerSide::new(4, 3);
        outcome.shots = PerSide::new(12, 8);
        let rows = generate_comparison_report(&estimate(0.5, 0.3, 0.2), &outcome, 0.45);
        assert_eq!(
            vec![
                ComparisonRow { market: Market::Winner, predicted: "LOCAL".into(), actual: "LOCAL".into(), status: Status::Hit },
                ComparisonRow { market: Market::Corners, predicted: "7-11".into(), actual: "10".into(), status: Status::Hit },
                ComparisonRow { market: Market::Cards, predicted: "3-5".into(), actual: "7".into(), status: Status::Miss },
                ComparisonRow { market: Market::Shots, predicted: "16-30".into(), actual: "20".into(), status: Status::Hit },
            ],
            rows
        );
    }

    #[test]
    fn range_text_reconciliation() {
        let split = compare_range_text(Market::Corners, "🏠 4-6 | ✈️ 3-5", 11);
        assert_eq!("7-11", split.predicted);
        assert_eq!(Status::Hit, split.status);

        let total = compare_range_text(Market::Cards, "8-10", 7);
        assert_eq!("8-10", total.predicted);
        assert_eq!(Status::Miss, total.status);

        let single = compare_range_text(Market::Shots, "about 20", 20);
        assert_eq!("20-20", single.predicted);
        assert_eq!(Status::Hit, single.status);

        let blank = compare_range_text(Market::Shots, "unknown", 20);
        assert_eq!("unknown", blank.predicted);
        assert_eq!(Status::NotAvailable, blank.status);
        assert_eq!("⚪ N/A", blank.status.to_string());
    }

    #[test]
    fn oversized_range_text_saturates() {
        let row = compare_range_text(Market::Corners, "🏠 70000-70000 | ✈️ 3-5", 10);
        assert_eq!(format!("{0}-{0}", u16::MAX), row.predicted);
        assert_eq!(Status::Miss, row.status);
    }
}

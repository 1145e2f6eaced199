//! Three-way (1X2) market prices and their relationship to probabilities.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::domain::Winner;
use crate::probs;

/// Canonical labels of the match-result market. The derived order (1, X, 2) is the order in which
/// markets are evaluated.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString, EnumIter)]
pub enum MarketLabel {
    #[serde(rename = "1")]
    #[strum(serialize = "1")]
    Home,
    #[serde(rename = "X")]
    #[strum(serialize = "X")]
    Draw,
    #[serde(rename = "2")]
    #[strum(serialize = "2")]
    Away,
}
impl MarketLabel {
    pub const ALL: [MarketLabel; 3] = [MarketLabel::Home, MarketLabel::Draw, MarketLabel::Away];

    /// The match result that settles this market as a winner.
    pub fn winner(&self) -> Winner {
        match self {
            MarketLabel::Home => Winner::Home,
            MarketLabel::Draw => Winner::Draw,
            MarketLabel::Away => Winner::Away,
        }
    }
}

/// Anything that assigns a probability to each label of the match-result market.
pub trait LabelledProbs {
    fn prob(&self, label: MarketLabel) -> f64;
}

/// Home, draw and away probabilities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreeWay {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}
impl ThreeWay {
    pub fn new(home: f64, draw: f64, away: f64) -> Self {
        Self { home, draw, away }
    }

    pub fn sum(&self) -> f64 {
        self.home + self.draw + self.away
    }
}

impl LabelledProbs for ThreeWay {
    fn prob(&self, label: MarketLabel) -> f64 {
        match label {
            MarketLabel::Home => self.home,
            MarketLabel::Draw => self.draw,
            MarketLabel::Away => self.away,
        }
    }
}

/// Decimal odds keyed by market label. Labels may be missing when a bookmaker does not quote them;
/// keys other than `1`, `X` and `2` are dropped when deserialising.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MarketOdds(BTreeMap<MarketLabel, f64>);

impl MarketOdds {
    pub fn new(home: f64, draw: f64, away: f64) -> Self {
        Self(BTreeMap::from([
            (MarketLabel::Home, home),
            (MarketLabel::Draw, draw),
            (MarketLabel::Away, away),
        ]))
    }

    pub fn get(&self, label: MarketLabel) -> Option<f64> {
        self.0.get(&label).copied()
    }

    pub fn insert(&mut self, label: MarketLabel, odds: f64) {
        self.0.insert(label, odds);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Quoted labels in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (MarketLabel, f64)> + '_ {
        self.0.iter().map(|(&label, &odds)| (label, odds))
    }

    /// Sum of implied probabilities over the quoted labels; exceeds 1 by the bookmaker margin.
    pub fn booksum(&self) -> f64 {
        self.iter().filter(|(_, odds)| *odds > 0.0).map(|(_, odds)| 1.0 / odds).sum()
    }

    /// Implied probabilities with the margin removed multiplicatively, together with the overround.
    pub fn fit_multiplicative(&self) -> (ThreeWay, f64) {
        let overround = self.booksum();
        let mut fair = ThreeWay::default();
        if overround > 0.0 {
            for (label, odds) in self.iter().filter(|(_, odds)| *odds > 0.0) {
                let prob = 1.0 / odds / overround;
                match label {
                    MarketLabel::Home => fair.home = prob,
                    MarketLabel::Draw => fair.draw = prob,
                    MarketLabel::Away => fair.away = prob,
                }
            }
        }
        (fair, overround)
    }

    /// Frames odds from probabilities by inflating each one by `overround` before inverting, and
    /// rounding to two decimals. Labels with a non-positive probability are not quoted.
    pub fn frame_multiplicative(probs: &impl LabelledProbs, overround: f64) -> Self {
        let mut odds = Self::default();
        for label in MarketLabel::ALL {
            let prob = probs.prob(label);
            if prob > 0.0 {
                odds.insert(label, probs::round(1.0 / (prob * overround), 2));
            }
        }
        odds
    }
}

impl<'de> Deserialize<'de> for MarketOdds {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let quoted = BTreeMap::<String, f64>::deserialize(deserializer)?;
        Ok(quoted
            .into_iter()
            .filter_map(|(key, odds)| MarketLabel::from_str(&key).ok().map(|label| (label, odds)))
            .collect())
    }
}

impl FromIterator<(MarketLabel, f64)> for MarketOdds {
    fn from_iter<T: IntoIterator<Item = (MarketLabel, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

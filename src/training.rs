//! Historical match records, feature preparation and the train-then-validate cycle.

use serde::{Deserialize, Serialize};
use tinyrand::{Seeded, StdRand};
use tracing::info;

use crate::domain::Winner;
use crate::ensemble::{
    random_f64, Classifier, CrossValidation, Dataset, EnsembleClassifier, Metrics, TrainError, DEFAULT_FOLDS,
};

/// Expected-goals margin beyond which a side is taken to have won.
const DECISIVE_MARGIN: f64 = 1.0;

pub const FEATURE_NAMES: [&str; 5] = ["home_xg", "away_xg", "home_possession", "ppda", "xg_diff"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub match_id: String,
    pub home_xg: f64,
    pub away_xg: f64,
    pub home_possession: f64,
    /// Passes allowed per defensive action.
    pub ppda: f64,
    pub target: Winner,
}
impl HistoricalRecord {
    /// Model inputs, in [`FEATURE_NAMES`] order.
    pub fn features(&self) -> Vec<f64> {
        vec![
            self.home_xg,
            self.away_xg,
            self.home_possession,
            self.ppda,
            self.home_xg - self.away_xg,
        ]
    }
}

/// Labels a fixture by its expected-goals margin.
pub fn decisive_winner(home_xg: f64, away_xg: f64) -> Winner {
    if home_xg > away_xg + DECISIVE_MARGIN {
        Winner::Home
    } else if away_xg > home_xg + DECISIVE_MARGIN {
        Winner::Away
    } else {
        Winner::Draw
    }
}

/// A reproducible stand-in for a historical feed: uniformly drawn expected goals, possession and
/// pressing intensity, labelled by [`decisive_winner`].
pub fn synthetic_history(matches: usize, seed: u64) -> Vec<HistoricalRecord> {
    let mut rand = StdRand::seed(seed);
    let mut uniform = |low: f64, high: f64| low + random_f64(&mut rand) * (high - low);
    (0..matches)
        .map(|index| {
            let home_xg = uniform(0.5, 3.0);
            let away_xg = uniform(0.5, 2.5);
            HistoricalRecord {
                match_id: format!("hist_{index}"),
                home_xg,
                away_xg,
                home_possession: uniform(40.0, 60.0),
                ppda: uniform(7.0, 15.0),
                target: decisive_winner(home_xg, away_xg),
            }
        })
        .collect()
}

/// Drops duplicate records (by match id, keeping the first) and builds the feature matrix.
pub fn prepare_features(records: &[HistoricalRecord]) -> Result<Dataset, TrainError> {
    let mut seen = rustc_hash::FxHashSet::default();
    let unique: Vec<_> = records
        .iter()
        .filter(|record| seen.insert(record.match_id.as_str()))
        .collect();
    Dataset::from_rows(
        FEATURE_NAMES.iter().map(|&name| name.to_owned()).collect(),
        unique.iter().map(|record| record.features()).collect(),
        unique.iter().map(|record| record.target).collect(),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub metrics: Metrics,
    pub cross_validation: CrossValidation,
    pub samples: usize,
}

/// Trains the classifier on the records, then cross-validates the same configuration.
pub fn run_cycle(classifier: &mut EnsembleClassifier, records: &[HistoricalRecord]) -> Result<TrainingReport, TrainError> {
    let dataset = prepare_features(records)?;
    let metrics = classifier.train(&dataset)?;
    let cross_validation = classifier.cross_validate(&dataset, DEFAULT_FOLDS)?;
    info!(
        "training cycle over {} samples: {metrics:?}, cv {} ± {}",
        dataset.len(),
        cross_validation.mean,
        cross_validation.std
    );
    Ok(TrainingReport {
        metrics,
        cross_validation,
        samples: dataset.len(),
    })
}

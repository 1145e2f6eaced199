//! Three-way outcome classification from historical feature vectors, as an alternative to the
//! parametric score model.
//!
//! Two models are trained side by side on the same data: a bagged forest, which is robust to
//! noise, and a gradient-boosted ensemble, which is more discriminative but quicker to overfit a
//! small sample. Predictions blend the two with the forest weighted higher. Training is seeded, so
//! repeated runs on the same data produce the same models.
//!
//! Classifiers sit behind [`Classifier`], which is also implemented by [`StubClassifier`]: a
//! fixed-output stand-in for when no model can or should be trained.

use strum_macros::{Display, EnumString};
use tinyrand::{Seeded, StdRand};
use tracing::{debug, info};

use crate::domain::Winner;
use crate::market::ThreeWay;
use crate::probs;

mod boost;
mod dataset;
mod forest;
mod metrics;
mod tree;

pub use boost::{BoostConfig, GradientBoosting};
pub use dataset::{Dataset, TrainError};
pub(crate) use dataset::random_f64;
pub use forest::{ForestConfig, RandomForest};
pub use metrics::{CrossValidation, Metrics};
pub use tree::{Tree, TreeConfig};

/// Returned by classifiers that have nothing better to offer.
pub const FALLBACK: ThreeWay = ThreeWay {
    home: 0.35,
    draw: 0.30,
    away: 0.35,
};

pub const DEFAULT_SEED: u64 = 74;

pub const DEFAULT_FOLDS: usize = 5;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FeatureImportance {
    pub name: String,
    pub importance: f64,
}

pub trait Classifier {
    fn train(&mut self, dataset: &Dataset) -> Result<Metrics, TrainError>;

    fn is_trained(&self) -> bool;

    fn predict_probabilities(&self, features: &[f64]) -> ThreeWay;

    /// The most probable result; ties go to the lower class ordinal.
    fn predict(&self, features: &[f64]) -> Winner {
        let classes = to_classes(&self.predict_probabilities(features));
        Winner::from_class(metrics::argmax(&classes)).unwrap_or(Winner::Draw)
    }

    /// Named importances, most important first. Empty until trained.
    fn feature_importances(&self) -> Vec<FeatureImportance>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ClassifierKind {
    #[default]
    Ensemble,
    Stub,
}

pub fn build(kind: ClassifierKind) -> Box<dyn Classifier> {
    match kind {
        ClassifierKind::Ensemble => Box::new(EnsembleClassifier::default()),
        ClassifierKind::Stub => Box::<StubClassifier>::default(),
    }
}

/// Class-ordinal view of a three-way: draw, home, away.
fn to_classes(three_way: &ThreeWay) -> [f64; Winner::CLASSES] {
    [three_way.draw, three_way.home, three_way.away]
}

fn from_classes(classes: &[f64; Winner::CLASSES]) -> ThreeWay {
    ThreeWay::new(classes[1], classes[0], classes[2])
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleConfig {
    pub forest: ForestConfig,
    pub boost: BoostConfig,
    /// Weight of the forest in the blend; the boosted model takes the remainder.
    pub robust_weight: f64,
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            forest: ForestConfig::default(),
            boost: BoostConfig::default(),
            robust_weight: 0.6,
            test_fraction: 0.2,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Models {
    forest: RandomForest,
    boost: GradientBoosting,
    feature_names: Vec<String>,
}
impl Models {
    fn fit(config: &EnsembleConfig, dataset: &Dataset, samples: &[usize], rand: &mut StdRand) -> Self {
        let forest = RandomForest::fit(dataset, samples, &config.forest, rand);
        let boost = GradientBoosting::fit(dataset, samples, &config.boost, rand);
        Self {
            forest,
            boost,
            feature_names: dataset.feature_names().to_vec(),
        }
    }

    fn predict_proba(&self, robust_weight: f64, row: &[f64]) -> [f64; Winner::CLASSES] {
        let robust = self.forest.predict_proba(row);
        let accurate = self.boost.predict_proba(row);
        std::array::from_fn(|class| robust_weight * robust[class] + (1.0 - robust_weight) * accurate[class])
    }

    fn evaluate(&self, robust_weight: f64, dataset: &Dataset, samples: &[usize]) -> Metrics {
        let actual: Vec<_> = samples.iter().map(|&sample| dataset.labels()[sample]).collect();
        let predicted: Vec<_> = samples
            .iter()
            .map(|&sample| self.predict_proba(robust_weight, dataset.row(sample)))
            .collect();
        Metrics::evaluate(&actual, &predicted)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnsembleClassifier {
    config: EnsembleConfig,
    models: Option<Models>,
}
impl EnsembleClassifier {
    pub fn new(config: EnsembleConfig) -> Self {
        Self { config, models: None }
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    /// Accuracy of freshly trained ensembles over a shuffled k-fold partition. The classifier's own
    /// trained state is untouched.
    pub fn cross_validate(&self, dataset: &Dataset, folds: usize) -> Result<CrossValidation, TrainError> {
        dataset.ensure_multiclass()?;
        let mut rand = StdRand::seed(self.config.seed);
        let partition = dataset.folds(folds, &mut rand)?;
        let scores = partition
            .iter()
            .enumerate()
            .map(|(fold, (train, test))| {
                let models = Models::fit(&self.config, dataset, train, &mut rand);
                let accuracy = models.evaluate(self.config.robust_weight, dataset, test).accuracy;
                debug!("fold {fold}: accuracy {accuracy}");
                accuracy
            })
            .collect();
        let cross_validation = CrossValidation::from_scores(scores);
        info!(
            "{folds}-fold accuracy {} ± {}",
            cross_validation.mean, cross_validation.std
        );
        Ok(cross_validation)
    }
}

impl Classifier for EnsembleClassifier {
    /// Fits both models on a seeded 80/20 split and scores the blend on the held-out part.
    fn train(&mut self, dataset: &Dataset) -> Result<Metrics, TrainError> {
        dataset.ensure_multiclass()?;
        let mut rand = StdRand::seed(self.config.seed);
        let (train, test) = dataset.train_test_split(self.config.test_fraction, &mut rand);
        if train.is_empty() || test.is_empty() {
            return Err(TrainError::TooFewRows {
                rows: dataset.len(),
                folds: 2,
            });
        }
        let models = Models::fit(&self.config, dataset, &train, &mut rand);
        let metrics = models.evaluate(self.config.robust_weight, dataset, &test);
        info!(
            "trained on {} samples, tested on {}: {metrics:?}",
            train.len(),
            test.len()
        );
        self.models = Some(models);
        Ok(metrics)
    }

    fn is_trained(&self) -> bool {
        self.models.is_some()
    }

    /// Blended probabilities rounded to four places, or [`FALLBACK`] if untrained.
    fn predict_probabilities(&self, features: &[f64]) -> ThreeWay {
        match &self.models {
            None => FALLBACK,
            Some(models) => {
                let classes = models.predict_proba(self.config.robust_weight, features);
                let three_way = from_classes(&classes);
                ThreeWay::new(
                    probs::round(three_way.home, 4),
                    probs::round(three_way.draw, 4),
                    probs::round(three_way.away, 4),
                )
            }
        }
    }

    /// Importances of the boosted model.
    fn feature_importances(&self) -> Vec<FeatureImportance> {
        let Some(models) = &self.models else {
            return vec![];
        };
        let mut importances: Vec<_> = models
            .feature_names
            .iter()
            .zip(models.boost.importances())
            .map(|(name, &importance)| FeatureImportance {
                name: name.clone(),
                importance,
            })
            .collect();
        importances.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        importances
    }
}

/// Always predicts [`FALLBACK`]. Training only checks the data and reports how the fixed
/// prediction fares on it.
#[derive(Debug, Clone, Default)]
pub struct StubClassifier {
    feature_names: Option<Vec<String>>,
}

impl Classifier for StubClassifier {
    fn train(&mut self, dataset: &Dataset) -> Result<Metrics, TrainError> {
        dataset.ensure_multiclass()?;
        let fixed = to_classes(&FALLBACK);
        let predicted = vec![fixed; dataset.len()];
        self.feature_names = Some(dataset.feature_names().to_vec());
        Ok(Metrics::evaluate(dataset.labels(), &predicted))
    }

    fn is_trained(&self) -> bool {
        self.feature_names.is_some()
    }

    fn predict_probabilities(&self, _: &[f64]) -> ThreeWay {
        FALLBACK
    }

    /// Equal importance for every feature.
    fn feature_importances(&self) -> Vec<FeatureImportance> {
        let names = self.feature_names.as_deref().unwrap_or_default();
        names
            .iter()
            .map(|name| FeatureImportance {
                name: name.clone(),
                importance: 1.0 / names.len() as f64,
            })
            .collect()
    }
}

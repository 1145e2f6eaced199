use tinyrand::Rand;

use crate::domain::Winner;
use crate::probs::SliceExt;

use super::dataset::Dataset;
use super::tree::{SquaredError, Tree, TreeConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct BoostConfig {
    pub rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_split: usize,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            rounds: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
        }
    }
}

/// Multiclass gradient boosting under the softmax loss: each round fits one regression tree per
/// class to the residuals `y − p` and takes a damped Newton step at every leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientBoosting {
    rounds: Vec<[Tree; Winner::CLASSES]>,
    learning_rate: f64,
    importances: Vec<f64>,
}
impl GradientBoosting {
    pub fn fit(dataset: &Dataset, samples: &[usize], config: &BoostConfig, rand: &mut impl Rand) -> Self {
        debug_assert!(!samples.is_empty());
        const SCALE: f64 = (Winner::CLASSES - 1) as f64 / Winner::CLASSES as f64;
        let tree_config = TreeConfig {
            max_depth: Some(config.max_depth),
            min_samples_split: config.min_samples_split,
            min_samples_leaf: 1,
            max_features: None,
        };

        let features = dataset.features();
        let labels = dataset.labels();
        let mut raw = vec![[0.0; Winner::CLASSES]; dataset.len()];
        let mut residuals = vec![vec![0.0; dataset.len()]; Winner::CLASSES];
        let mut hessians = vec![vec![0.0; dataset.len()]; Winner::CLASSES];
        let mut importances = vec![0.0; dataset.n_features()];
        let mut rounds = Vec::with_capacity(config.rounds);

        for _ in 0..config.rounds {
            for &sample in samples {
                let probs = softmax(&raw[sample]);
                for class in 0..Winner::CLASSES {
                    let target = if labels[sample] == class { 1.0 } else { 0.0 };
                    residuals[class][sample] = target - probs[class];
                    hessians[class][sample] = probs[class] * (1.0 - probs[class]);
                }
            }

            let trees: [Tree; Winner::CLASSES] = std::array::from_fn(|class| {
                let objective = SquaredError {
                    residuals: &residuals[class],
                    hessians: &hessians[class],
                    scale: SCALE,
                };
                Tree::fit(features, samples.to_vec(), &objective, &tree_config, &mut importances, rand)
            });

            for &sample in samples {
                for (class, tree) in trees.iter().enumerate() {
                    raw[sample][class] += config.learning_rate * tree.predict(&features[sample])[0];
                }
            }
            rounds.push(trees);
        }

        importances.normalise(1.0);
        Self {
            rounds,
            learning_rate: config.learning_rate,
            importances,
        }
    }

    /// Class probabilities in ordinal order.
    pub fn predict_proba(&self, row: &[f64]) -> [f64; Winner::CLASSES] {
        let mut raw = [0.0; Winner::CLASSES];
        for trees in &self.rounds {
            for (class, tree) in trees.iter().enumerate() {
                raw[class] += self.learning_rate * tree.predict(row)[0];
            }
        }
        softmax(&raw)
    }

    /// Impurity decrease per feature summed over all trees, normalised to sum to 1.
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn rounds(&self) -> usize {
        self.rounds.len()
    }
}

pub(crate) fn softmax(raw: &[f64; Winner::CLASSES]) -> [f64; Winner::CLASSES] {
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut probs = raw.map(|score| f64::exp(score - max));
    probs.normalise(1.0);
    probs
}

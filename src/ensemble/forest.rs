use tinyrand::Rand;

use crate::domain::Winner;
use crate::probs::SliceExt;

use super::dataset::{random_index, Dataset};
use super::tree::{Gini, Tree, TreeConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct ForestConfig {
    pub trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            trees: 100,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

/// Bagged classification trees, each grown on a bootstrap resample and considering `√features`
/// candidates per split. Probabilities are the mean of the leaf class proportions.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    trees: Vec<Tree>,
    importances: Vec<f64>,
}
impl RandomForest {
    pub fn fit(dataset: &Dataset, samples: &[usize], config: &ForestConfig, rand: &mut impl Rand) -> Self {
        debug_assert!(!samples.is_empty());
        let n_features = dataset.n_features();
        let tree_config = TreeConfig {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: 1,
            max_features: Some(usize::max(1, (n_features as f64).sqrt() as usize)),
        };
        let objective = Gini { labels: dataset.labels() };
        let mut importances = vec![0.0; n_features];
        let mut tree_importances = vec![0.0; n_features];
        let trees = (0..config.trees)
            .map(|_| {
                let bootstrap = (0..samples.len())
                    .map(|_| samples[random_index(rand, samples.len())])
                    .collect();
                tree_importances.fill(0.0);
                let tree = Tree::fit(dataset.features(), bootstrap, &objective, &tree_config, &mut tree_importances, rand);
                tree_importances.normalise(1.0);
                for (sum, importance) in importances.iter_mut().zip(&tree_importances) {
                    *sum += importance;
                }
                tree
            })
            .collect::<Vec<_>>();
        if !trees.is_empty() {
            importances.scale(1.0 / trees.len() as f64);
        }
        Self { trees, importances }
    }

    /// Class probabilities in ordinal order.
    pub fn predict_proba(&self, row: &[f64]) -> [f64; Winner::CLASSES] {
        let mut probs = [0.0; Winner::CLASSES];
        for tree in &self.trees {
            for (class, prob) in tree.predict(row).iter().enumerate() {
                probs[class] += prob;
            }
        }
        probs.scale(1.0 / self.trees.len().max(1) as f64);
        probs
    }

    /// Mean over the trees of each tree's normalised impurity decrease per feature.
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }
}

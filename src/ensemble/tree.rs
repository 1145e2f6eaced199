//! Binary decision trees grown greedily (CART) under a pluggable split objective.

use tinyrand::Rand;

use crate::domain::Winner;
use crate::linear::Matrix;

use super::dataset::random_index;

/// Node statistics that can be updated one sample at a time, so that every threshold on a sorted
/// feature is scored in a single sweep.
pub trait Objective {
    type Stats: Clone;

    fn empty(&self) -> Self::Stats;

    fn add(&self, stats: &mut Self::Stats, sample: usize);

    fn remove(&self, stats: &mut Self::Stats, sample: usize);

    /// Per-sample impurity of a node holding `count` samples.
    fn impurity(&self, stats: &Self::Stats, count: usize) -> f64;

    fn leaf(&self, samples: &[usize]) -> Vec<f64>;
}

/// Gini impurity over the class labels; leaves hold class proportions.
pub struct Gini<'a> {
    pub labels: &'a [usize],
}

impl Objective for Gini<'_> {
    type Stats = [f64; Winner::CLASSES];

    fn empty(&self) -> Self::Stats {
        [0.0; Winner::CLASSES]
    }

    fn add(&self, stats: &mut Self::Stats, sample: usize) {
        stats[self.labels[sample]] += 1.0;
    }

    fn remove(&self, stats: &mut Self::Stats, sample: usize) {
        stats[self.labels[sample]] -= 1.0;
    }

    fn impurity(&self, stats: &Self::Stats, count: usize) -> f64 {
        if count == 0 {
            return 0.0;
        }
        let count = count as f64;
        1.0 - stats.iter().map(|&class| (class / count).powi(2)).sum::<f64>()
    }

    fn leaf(&self, samples: &[usize]) -> Vec<f64> {
        let mut proportions = vec![0.0; Winner::CLASSES];
        for &sample in samples {
            proportions[self.labels[sample]] += 1.0;
        }
        let count = samples.len() as f64;
        for proportion in &mut proportions {
            *proportion /= count;
        }
        proportions
    }
}

/// Variance of the residuals; leaves hold a single Newton step `scale · Σr / Σh`.
pub struct SquaredError<'a> {
    pub residuals: &'a [f64],
    pub hessians: &'a [f64],
    pub scale: f64,
}

impl Objective for SquaredError<'_> {
    type Stats = (f64, f64);

    fn empty(&self) -> Self::Stats {
        (0.0, 0.0)
    }

    fn add(&self, stats: &mut Self::Stats, sample: usize) {
        let residual = self.residuals[sample];
        stats.0 += residual;
        stats.1 += residual * residual;
    }

    fn remove(&self, stats: &mut Self::Stats, sample: usize) {
        let residual = self.residuals[sample];
        stats.0 -= residual;
        stats.1 -= residual * residual;
    }

    fn impurity(&self, stats: &Self::Stats, count: usize) -> f64 {
        if count == 0 {
            return 0.0;
        }
        let count = count as f64;
        let mean = stats.0 / count;
        f64::max(0.0, stats.1 / count - mean * mean)
    }

    fn leaf(&self, samples: &[usize]) -> Vec<f64> {
        let (mut numerator, mut denominator) = (0.0, 0.0);
        for &sample in samples {
            numerator += self.residuals[sample];
            denominator += self.hessians[sample];
        }
        let step = if denominator < 1e-12 { 0.0 } else { self.scale * numerator / denominator };
        vec![step]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeConfig {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered at each split; all of them if `None`.
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf(Vec<f64>),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

struct Candidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}
impl Tree {
    /// Grows a tree over `samples`, which index rows of `features`. The total impurity decrease
    /// achieved on each feature is added to `importances`.
    pub fn fit<O: Objective>(
        features: &Matrix<f64>,
        samples: Vec<usize>,
        objective: &O,
        config: &TreeConfig,
        importances: &mut [f64],
        rand: &mut impl Rand,
    ) -> Self {
        debug_assert_eq!(features.cols(), importances.len());
        debug_assert!(!samples.is_empty());
        let mut builder = Builder {
            features,
            objective,
            config,
            importances,
            feature_pool: (0..features.cols()).collect(),
            nodes: vec![],
        };
        builder.grow(samples, 0, rand);
        Self { nodes: builder.nodes }
    }

    /// The leaf values reached by `row`.
    pub fn predict(&self, row: &[f64]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf(values) => return values,
                Node::Split { feature, threshold, left, right } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn depth_from(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf(_) => 0,
                Node::Split { left, right, .. } => 1 + usize::max(depth_from(nodes, *left), depth_from(nodes, *right)),
            }
        }
        depth_from(&self.nodes, 0)
    }

    pub fn leaves(&self) -> usize {
        self.nodes.iter().filter(|node| matches!(node, Node::Leaf(_))).count()
    }
}

struct Builder<'a, O: Objective> {
    features: &'a Matrix<f64>,
    objective: &'a O,
    config: &'a TreeConfig,
    importances: &'a mut [f64],
    feature_pool: Vec<usize>,
    nodes: Vec<Node>,
}
impl<O: Objective> Builder<'_, O> {
    fn grow(&mut self, mut samples: Vec<usize>, depth: usize, rand: &mut impl Rand) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf(vec![]));

        let splittable = samples.len() >= self.config.min_samples_split
            && self.config.max_depth.map_or(true, |max_depth| depth < max_depth);
        let candidate = if splittable { self.best_split(&mut samples, rand) } else { None };

        match candidate {
            Some(candidate) => {
                self.importances[candidate.feature] += candidate.gain;
                let (left, right): (Vec<_>, Vec<_>) = samples
                    .into_iter()
                    .partition(|&sample| self.features[(sample, candidate.feature)] <= candidate.threshold);
                let left = self.grow(left, depth + 1, rand);
                let right = self.grow(right, depth + 1, rand);
                self.nodes[index] = Node::Split {
                    feature: candidate.feature,
                    threshold: candidate.threshold,
                    left,
                    right,
                };
            }
            None => {
                self.nodes[index] = Node::Leaf(self.objective.leaf(&samples));
            }
        }
        index
    }

    fn best_split(&mut self, samples: &mut [usize], rand: &mut impl Rand) -> Option<Candidate> {
        let mut parent = self.objective.empty();
        for &sample in samples.iter() {
            self.objective.add(&mut parent, sample);
        }
        let count = samples.len();
        let parent_impurity = self.objective.impurity(&parent, count);
        if parent_impurity <= 0.0 {
            return None;
        }

        // partial Fisher–Yates over the feature pool
        let available = self.feature_pool.len();
        let considered = self.config.max_features.unwrap_or(available).clamp(1, available);
        for i in 0..considered {
            let j = i + random_index(rand, available - i);
            self.feature_pool.swap(i, j);
        }

        let min_leaf = self.config.min_samples_leaf.max(1);
        let mut best: Option<Candidate> = None;
        for &feature in &self.feature_pool[..considered] {
            let features = self.features;
            samples.sort_by(|&a, &b| features[(a, feature)].total_cmp(&features[(b, feature)]));
            let mut left = self.objective.empty();
            let mut right = parent.clone();
            for split in 1..count {
                let moved = samples[split - 1];
                self.objective.add(&mut left, moved);
                self.objective.remove(&mut right, moved);
                let (below, above) = (features[(moved, feature)], features[(samples[split], feature)]);
                if below == above || split < min_leaf || count - split < min_leaf {
                    continue;
                }
                let gain = count as f64 * parent_impurity
                    - split as f64 * self.objective.impurity(&left, split)
                    - (count - split) as f64 * self.objective.impurity(&right, count - split);
                if gain > best.as_ref().map_or(1e-12, |best| best.gain + 1e-12) {
                    best = Some(Candidate {
                        feature,
                        threshold: (below + above) / 2.0,
                        gain,
                    });
                }
            }
        }
        best
    }
}

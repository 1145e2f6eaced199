use serde::{Deserialize, Serialize};

use crate::domain::Winner;
use crate::probs::{self, SliceExt};

/// Held-out performance, each figure rounded to four places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub accuracy: f64,
    /// F1 per class, weighted by the class's support.
    pub f1: f64,
    /// One-vs-rest ROC AUC, averaged over the classes.
    pub auc_roc: f64,
}
impl Metrics {
    pub fn evaluate(actual: &[usize], predicted_probs: &[[f64; Winner::CLASSES]]) -> Self {
        let predicted: Vec<_> = predicted_probs.iter().map(argmax).collect();
        Self {
            accuracy: probs::round(accuracy(actual, &predicted), 4),
            f1: probs::round(weighted_f1(actual, &predicted), 4),
            auc_roc: probs::round(ovr_auc(actual, predicted_probs), 4),
        }
    }
}

/// Spread of accuracy across folds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossValidation {
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub scores: Vec<f64>,
}
impl CrossValidation {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        Self {
            mean: probs::round(scores.mean(), 4),
            std: probs::round(scores.std_dev(), 4),
            scores,
        }
    }
}

/// First class with the highest probability.
pub fn argmax(probs: &[f64; Winner::CLASSES]) -> usize {
    probs.argmax().unwrap_or_default()
}

pub fn accuracy(actual: &[usize], predicted: &[usize]) -> f64 {
    debug_assert_eq!(actual.len(), predicted.len());
    if actual.is_empty() {
        return 0.0;
    }
    let correct = actual.iter().zip(predicted).filter(|(actual, predicted)| actual == predicted).count();
    correct as f64 / actual.len() as f64
}

/// Per-class F1 weighted by true support. A class with no predictions or no support scores 0.
pub fn weighted_f1(actual: &[usize], predicted: &[usize]) -> f64 {
    debug_assert_eq!(actual.len(), predicted.len());
    if actual.is_empty() {
        return 0.0;
    }
    let mut weighted = 0.0;
    for class in 0..Winner::CLASSES {
        let (mut true_pos, mut false_pos, mut false_neg) = (0usize, 0usize, 0usize);
        for (&actual, &predicted) in actual.iter().zip(predicted) {
            match (actual == class, predicted == class) {
                (true, true) => true_pos += 1,
                (false, true) => false_pos += 1,
                (true, false) => false_neg += 1,
                (false, false) => {}
            }
        }
        let support = true_pos + false_neg;
        let denominator = 2 * true_pos + false_pos + false_neg;
        if support > 0 && denominator > 0 {
            let f1 = 2.0 * true_pos as f64 / denominator as f64;
            weighted += f1 * support as f64;
        }
    }
    weighted / actual.len() as f64
}

/// Mean over classes of the one-vs-rest AUC. Classes without both positive and negative samples
/// are skipped; if none qualify, the result is 0.5.
pub fn ovr_auc(actual: &[usize], predicted_probs: &[[f64; Winner::CLASSES]]) -> f64 {
    debug_assert_eq!(actual.len(), predicted_probs.len());
    let aucs: Vec<_> = (0..Winner::CLASSES)
        .filter_map(|class| {
            let scored: Vec<_> = actual
                .iter()
                .zip(predicted_probs)
                .map(|(&actual, probs)| (probs[class], actual == class))
                .collect();
            binary_auc(&scored)
        })
        .collect();
    if aucs.is_empty() {
        0.5
    } else {
        aucs.mean()
    }
}

/// Mann–Whitney estimate of the probability that a random positive outscores a random negative,
/// with tied scores given average ranks. `None` unless both outcomes are present.
pub fn binary_auc(scored: &[(f64, bool)]) -> Option<f64> {
    let positives = scored.iter().filter(|(_, positive)| *positive).count();
    let negatives = scored.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }
    let mut order: Vec<_> = (0..scored.len()).collect();
    order.sort_by(|&a, &b| scored[a].0.total_cmp(&scored[b].0));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scored[order[end]].0 == scored[order[start]].0 {
            end += 1;
        }
        // ranks are 1-based; a tied run shares the mean of its ranks
        let rank = (start + 1 + end) as f64 / 2.0;
        positive_rank_sum += rank * order[start..end].iter().filter(|&&index| scored[index].1).count() as f64;
        start = end;
    }
    let positives = positives as f64;
    Some((positive_rank_sum - positives * (positives + 1.0) / 2.0) / (positives * negatives as f64))
}

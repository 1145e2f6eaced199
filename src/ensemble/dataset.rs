use thiserror::Error;
use tinyrand::Rand;

use crate::domain::Winner;
use crate::linear::Matrix;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrainError {
    #[error("no samples to train on")]
    Empty,

    #[error("row {row} has {actual} features; expected {expected}")]
    Ragged { row: usize, expected: usize, actual: usize },

    #[error("{rows} rows but {labels} labels")]
    LabelCount { rows: usize, labels: usize },

    #[error("all samples belong to a single class")]
    SingleClass,

    #[error("{rows} rows cannot be split into {folds} folds")]
    TooFewRows { rows: usize, folds: usize },
}

/// Numeric feature rows with a three-way class label per row. Identifier and label columns are
/// never part of the features.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    feature_names: Vec<String>,
    features: Matrix<f64>,
    labels: Vec<usize>,
}
impl Dataset {
    pub fn from_rows(
        feature_names: Vec<String>,
        rows: Vec<Vec<f64>>,
        labels: Vec<Winner>,
    ) -> Result<Self, TrainError> {
        if rows.is_empty() {
            return Err(TrainError::Empty);
        }
        if rows.len() != labels.len() {
            return Err(TrainError::LabelCount {
                rows: rows.len(),
                labels: labels.len(),
            });
        }
        let expected = feature_names.len();
        let mut flat = Vec::with_capacity(rows.len() * expected);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != expected || expected == 0 {
                return Err(TrainError::Ragged {
                    row,
                    expected,
                    actual: values.len(),
                });
            }
            flat.extend(values);
        }
        Ok(Self {
            feature_names,
            features: Matrix::from_flat(flat, expected),
            labels: labels.iter().map(|label| label.ordinal()).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub(crate) fn features(&self) -> &Matrix<f64> {
        &self.features
    }

    pub fn row(&self, sample: usize) -> &[f64] {
        &self.features[sample]
    }

    /// Class ordinals, aligned with the rows.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of samples per class among the given samples.
    pub fn class_counts(&self, samples: &[usize]) -> [usize; Winner::CLASSES] {
        let mut counts = [0; Winner::CLASSES];
        for &sample in samples {
            counts[self.labels[sample]] += 1;
        }
        counts
    }

    pub fn ensure_multiclass(&self) -> Result<(), TrainError> {
        let all: Vec<_> = (0..self.len()).collect();
        let present = self.class_counts(&all).iter().filter(|&&count| count > 0).count();
        if present < 2 {
            Err(TrainError::SingleClass)
        } else {
            Ok(())
        }
    }

    /// Shuffles the sample indices and holds out `ceil(test_fraction · n)` of them, returning
    /// `(train, test)`.
    pub fn train_test_split(&self, test_fraction: f64, rand: &mut impl Rand) -> (Vec<usize>, Vec<usize>) {
        let mut samples: Vec<_> = (0..self.len()).collect();
        shuffle(&mut samples, rand);
        let test_len = ((self.len() as f64 * test_fraction).ceil() as usize).min(self.len());
        let train = samples.split_off(test_len);
        (train, samples)
    }

    /// Shuffled k-fold partition as `(train, test)` index pairs. The first `n mod k` folds hold one
    /// extra sample.
    pub fn folds(&self, folds: usize, rand: &mut impl Rand) -> Result<Vec<(Vec<usize>, Vec<usize>)>, TrainError> {
        if folds < 2 || self.len() < folds {
            return Err(TrainError::TooFewRows {
                rows: self.len(),
                folds,
            });
        }
        let mut samples: Vec<_> = (0..self.len()).collect();
        shuffle(&mut samples, rand);
        let (base, extra) = (self.len() / folds, self.len() % folds);
        let mut start = 0;
        let mut partition = Vec::with_capacity(folds);
        for fold in 0..folds {
            let end = start + base + usize::from(fold < extra);
            let test = samples[start..end].to_vec();
            let train = samples[..start].iter().chain(&samples[end..]).copied().collect();
            partition.push((train, test));
            start = end;
        }
        Ok(partition)
    }
}

/// Fisher–Yates.
pub(crate) fn shuffle<T>(items: &mut [T], rand: &mut impl Rand) {
    for i in (1..items.len()).rev() {
        let j = random_index(rand, i + 1);
        items.swap(i, j);
    }
}

#[inline]
pub(crate) fn random_index(rand: &mut impl Rand, len: usize) -> usize {
    (rand.next_u64() % len as u64) as usize
}

#[inline]
pub(crate) fn random_f64(rand: &mut impl Rand) -> f64 {
    rand.next_u64() as f64 / u64::MAX as f64
}

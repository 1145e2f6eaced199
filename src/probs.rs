//! Utilities for working with probabilities.

pub trait SliceExt {
    fn sum(&self) -> f64;
    fn normalise(&mut self, target: f64) -> f64;
    fn scale(&mut self, factor: f64);
    fn mean(&self) -> f64;
    fn std_dev(&self) -> f64;
    fn argmax(&self) -> Option<usize>;
}
impl SliceExt for [f64] {
    fn sum(&self) -> f64 {
        self.iter().sum()
    }

    /// Scales the elements so that they sum to `target`, returning the original sum. An all-zero
    /// slice is left untouched.
    fn normalise(&mut self, target: f64) -> f64 {
        let sum = self.sum();
        if sum > 0.0 {
            self.scale(target / sum);
        }
        sum
    }

    fn scale(&mut self, factor: f64) {
        for element in self {
            *element *= factor;
        }
    }

    fn mean(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.sum() / self.len() as f64
        }
    }

    /// Population standard deviation.
    fn std_dev(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / self.len() as f64;
        variance.sqrt()
    }

    /// Index of the largest element; the first one wins ties.
    fn argmax(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, &value) in self.iter().enumerate() {
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((index, value)),
            }
        }
        best.map(|(index, _)| index)
    }
}

/// Rounds `value` to the given number of decimal `places`.
#[inline]
pub fn round(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::assert_slice_f64_near;
    use assert_float_eq::*;

    #[test]
    fn sum() {
        let data = [0.0, 0.1, 0.2];
        assert_f64_near!(0.30000000000000004, data.sum(), 1);
    }

    #[test]
    fn normalise() {
        let mut data = [0.05, 0.1, 0.15, 0.2];
        let sum = data.normalise(1.0);
        assert_f64_near!(0.5, sum, 1);
        assert_slice_f64_near(&[0.1, 0.2, 0.3, 0.4], &data, 1);
    }

    #[test]
    fn normalise_zeros() {
        let mut data = [0.0, 0.0];
        assert_eq!(0.0, data.normalise(1.0));
        assert_eq!([0.0, 0.0], data);
    }

    #[test]
    fn mean_and_std_dev() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_f64_near!(5.0, data.mean());
        assert_f64_near!(2.0, data.std_dev());
        let empty: [f64; 0] = [];
        assert_eq!(0.0, empty.mean());
        assert_eq!(0.0, empty.std_dev());
    }

    #[test]
    fn argmax() {
        assert_eq!(Some(1), [0.2, 0.5, 0.3].argmax());
        assert_eq!(Some(0), [0.4, 0.4, 0.2].argmax());
        let empty: [f64; 0] = [];
        assert_eq!(None, empty.argmax());
    }

    #[test]
    fn rounding() {
        assert_eq!(0.1235, round(0.123456, 4));
        assert_eq!(36.5, round(36.499999, 2));
        assert_eq!(0.6667, round(2.0 / 3.0, 4));
    }
}

use crate::factorial;
use crate::factorial::Factorial;

#[inline]
pub fn univariate(k: u8, lambda: f64, factorial: &impl Factorial) -> f64 {
    lambda.powi(k as i32) * f64::exp(-lambda) / factorial.get(k) as f64
}

/// Probability of exactly `k` events given the rate `lambda`.
///
/// A non-positive rate is treated as certainty of zero events rather than a domain error, so
/// callers never see `NaN` from a corrupted rate.
pub fn pmf(lambda: f64, k: u32) -> f64 {
    if lambda <= 0.0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    if k <= factorial::MAX_EXACT as u32 {
        univariate(k as u8, lambda, &factorial::LOOKUP)
    } else {
        log_space(k, lambda)
    }
}

#[inline]
fn log_space(k: u32, lambda: f64) -> f64 {
    f64::exp(k as f64 * lambda.ln() - lambda - factorial::LOOKUP.ln(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factorial::Calculator;
    use assert_float_eq::*;

    #[test]
    pub fn test_univariate() {
        assert_float_relative_eq!(0.36787944117144233, univariate(0, 1.0, &Calculator));
        assert_float_relative_eq!(0.36787944117144233, univariate(1, 1.0, &Calculator));
        assert_float_relative_eq!(0.18393972058572117, univariate(2, 1.0, &Calculator));
        assert_float_relative_eq!(0.0820849986238988, univariate(0, 2.5, &Calculator));
        assert_float_relative_eq!(0.205212496559747, univariate(1, 2.5, &Calculator));
        assert_float_relative_eq!(0.25651562069968376, univariate(2, 2.5, &Calculator));
    }

    #[test]
    fn degenerate_rate() {
        for lambda in [0.0, -0.5, -10.0] {
            assert_eq!(1.0, pmf(lambda, 0));
            assert_eq!(0.0, pmf(lambda, 1));
            assert_eq!(0.0, pmf(lambda, 7));
        }
    }

    #[test]
    fn mass_sums_to_one() {
        for lambda in [0.05, 0.3, 0.4, 1.0, 1.35, 2.2, 3.7, 4.5, 5.0] {
            let sum: f64 = (0..=20).map(|k| pmf(lambda, k)).sum();
            assert_float_absolute_eq!(1.0, sum, 1e-6);
        }
    }

    #[test]
    fn log_space_agrees_with_exact() {
        for lambda in [0.9, 12.0, 30.0] {
            assert_float_relative_eq!(univariate(34, lambda, &Calculator), log_space(34, lambda), 1e-9);
        }
        assert!(pmf(30.0, 35) > 0.0);
        assert!(pmf(30.0, 35) < pmf(30.0, 30));
    }
}

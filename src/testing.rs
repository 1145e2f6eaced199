//! Float assertions shared by the unit tests.

use assert_float_eq::*;

use crate::market::ThreeWay;

fn assert_same_len(expected: &[f64], actual: &[f64]) {
    assert_eq!(
        expected.len(),
        actual.len(),
        "lengths differ: {expected:?} vs {actual:?}"
    );
}

/// Elementwise comparison within `distance` ULPs; exact matches (including infinities) pass.
pub fn assert_slice_f64_near(expected: &[f64], actual: &[f64], distance: u32) {
    assert_same_len(expected, actual);
    for (&expected, &actual) in expected.iter().zip(actual) {
        if actual != expected {
            assert_f64_near!(expected, actual, distance);
        }
    }
}

pub fn assert_slice_f64_absolute(expected: &[f64], actual: &[f64], epsilon: f64) {
    assert_same_len(expected, actual);
    for (&expected, &actual) in expected.iter().zip(actual) {
        assert_float_absolute_eq!(expected, actual, epsilon);
    }
}

/// Compares home, draw and away in that order.
pub fn assert_three_way_absolute(expected: &ThreeWay, actual: &ThreeWay, epsilon: f64) {
    assert_slice_f64_absolute(
        &[expected.home, expected.draw, expected.away],
        &[actual.home, actual.draw, actual.away],
        epsilon,
    );
}

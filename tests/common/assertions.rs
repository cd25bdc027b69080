//! Assertions for resampled series.

/// Default tolerance for comparing resampled values
pub const DEFAULT_EPSILON: f32 = 1e-6;

/// Assert that two series have the same length and agree element-wise within `epsilon`.
///
/// # Panics
///
/// Panics on a length mismatch or on the first element that differs by more
/// than `epsilon` (default: 1e-6). A NaN on either side never matches.
pub fn assert_array_approx_eq(actual: &[f32], expected: &[f32], epsilon: Option<f32>) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Series have different lengths: actual = {:?}, expected = {:?}",
        actual,
        expected
    );

    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        let diff = (a - e).abs();
        assert!(
            diff <= eps,
            "Series differ at index {}: actual = {}, expected = {}, diff = {}, epsilon = {}",
            i,
            a,
            e,
            diff,
            eps
        );
    }
}

/// Assert that every value of a series is finite.
pub fn assert_all_finite(actual: &[f32]) {
    for (i, v) in actual.iter().enumerate() {
        assert!(v.is_finite(), "Value at index {} is not finite: {}", i, v);
    }
}

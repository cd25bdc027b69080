//! Linear interpolation.
//!
//! Blends the sample at or before an instant with the one after it.

use super::common::linear_weight;
use super::{Stencil, TemporalInterpolator};

/// Linear interpolator
pub struct LinearInterpolator;

impl TemporalInterpolator for LinearInterpolator {
    fn interpolate(&self, window: &[f32], index: usize, fraction: f32) -> f32 {
        let a = window[index];
        // On a knot the sample is returned as stored. The plain blend would
        // give NaN here whenever the next sample is missing.
        if fraction == 0.0 {
            return a;
        }
        let b = window.get(index + 1).copied().unwrap_or(a);
        let (wa, wb) = linear_weight(fraction);
        a * wa + b * wb
    }

    fn stencil(&self) -> Stencil {
        Stencil {
            before: 0,
            after: 1,
        }
    }

    fn name(&self) -> &str {
        "linear"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_interpolation() {
        let window = [10.0, 20.0, 30.0];
        let kernel = LinearInterpolator;

        assert_eq!(kernel.interpolate(&window, 0, 0.0), 10.0);
        assert_eq!(kernel.interpolate(&window, 0, 0.5), 15.0);
        assert_eq!(kernel.interpolate(&window, 1, 0.25), 22.5);
        assert!((kernel.interpolate(&window, 1, 0.999) - 30.0).abs() < 0.02);
    }

    #[test]
    fn test_missing_next_sample_repeats_current() {
        let kernel = LinearInterpolator;
        assert_eq!(kernel.interpolate(&[10.0, 20.0], 1, 0.5), 20.0);
    }

    #[test]
    fn test_floor_sample_is_exact_even_next_to_nan() {
        let kernel = LinearInterpolator;
        assert_eq!(kernel.interpolate(&[30.0, f32::NAN], 0, 0.0), 30.0);
        assert!(kernel.interpolate(&[30.0, f32::NAN], 0, 0.5).is_nan());
    }
}

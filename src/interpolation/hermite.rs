//! Cubic Hermite interpolation (uniform Catmull-Rom spline).
//!
//! Uses two samples on either side of the interval. Missing neighbours are
//! replaced before the spline is evaluated so a single NaN next to the
//! interval does not wipe out the value.

use super::{Stencil, TemporalInterpolator};

/// Cubic Hermite interpolator
pub struct HermiteInterpolator;

/// The four spline control points `[A, B, C, D]` around `window[index]`.
///
/// `B` is `window[index]`. Out-of-range or NaN neighbours are substituted:
/// `A` and `C` fall back to `B`; `D` falls back to `C` past the end of the
/// window but to `B` when it is NaN.
pub fn control_points(window: &[f32], index: usize) -> [f32; 4] {
    let b = window[index];
    let a = match index.checked_sub(1).map(|i| window[i]) {
        Some(v) if !v.is_nan() => v,
        _ => b,
    };
    let c = match window.get(index + 1) {
        Some(&v) if !v.is_nan() => v,
        _ => b,
    };
    let d = match window.get(index + 2) {
        None => c,
        Some(&v) if v.is_nan() => b,
        Some(&v) => v,
    };
    [a, b, c, d]
}

/// Evaluate the Catmull-Rom segment between `B` and `C` at `fraction`.
pub fn catmull_rom([a, b, c, d]: [f32; 4], fraction: f32) -> f32 {
    let k3 = -a / 2.0 + (3.0 * b) / 2.0 - (3.0 * c) / 2.0 + d / 2.0;
    let k2 = a - (5.0 * b) / 2.0 + 2.0 * c - d / 2.0;
    let k1 = -a / 2.0 + c / 2.0;
    let k0 = b;
    k3 * fraction * fraction * fraction + k2 * fraction * fraction + k1 * fraction + k0
}

impl TemporalInterpolator for HermiteInterpolator {
    fn interpolate(&self, window: &[f32], index: usize, fraction: f32) -> f32 {
        catmull_rom(control_points(window, index), fraction)
    }

    fn stencil(&self) -> Stencil {
        Stencil {
            before: 1,
            after: 2,
        }
    }

    fn name(&self) -> &str {
        "hermite"
    }
}

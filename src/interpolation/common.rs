//! Common utilities for interpolation kernels.

use crate::time::Timestamp;

/// Round to the precision a store with this scale factor can represent.
///
/// Values are stored as `round(value * scalefactor)`, so anything finer is
/// detail the data never had. NaN stays NaN.
pub fn quantize(value: f32, scalefactor: f32) -> f32 {
    (value * scalefactor).round() / scalefactor
}

/// Position of `t` between two native samples, in `[0, 1)`
pub fn fraction(t: Timestamp, native_dt: i64) -> f32 {
    t.seconds().rem_euclid(native_dt) as f32 / native_dt as f32
}

/// Get the weight for linear interpolation
pub fn linear_weight(fraction: f32) -> (f32, f32) {
    (1.0 - fraction, fraction)
}

//! Temporal interpolation from a native cadence to a finer one.
//!
//! Kernels evaluate one output value from a window of native samples, an index
//! into that window and the fractional position between `index` and `index+1`.

pub mod common;
pub mod hermite;
pub mod linear;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PointcastError, Result};

/// Interpolation kernel selected by a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Linear,
    Nearest,
    SolarBackwardsAveraged,
    Hermite,
    HermiteBackwardsAveraged,
}

impl Interpolation {
    pub const ALL: [Interpolation; 5] = [
        Interpolation::Linear,
        Interpolation::Nearest,
        Interpolation::SolarBackwardsAveraged,
        Interpolation::Hermite,
        Interpolation::HermiteBackwardsAveraged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interpolation::Linear => "linear",
            Interpolation::Nearest => "nearest",
            Interpolation::SolarBackwardsAveraged => "solar_backwards_averaged",
            Interpolation::Hermite => "hermite",
            Interpolation::HermiteBackwardsAveraged => "hermite_backwards_averaged",
        }
    }

    pub fn is_implemented(&self) -> bool {
        get_interpolator(*self).is_ok()
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interpolation {
    type Err = PointcastError;

    fn from_str(s: &str) -> Result<Self> {
        Interpolation::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.to_lowercase())
            .ok_or_else(|| PointcastError::InvalidParameter {
                param: "interpolation".to_string(),
                message: format!("Unknown interpolation method: {}", s),
            })
    }
}

/// Native samples a kernel reads around the sample at or before an output instant.
///
/// `before` samples precede it and `after` samples follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stencil {
    pub before: usize,
    pub after: usize,
}

/// Trait for temporal interpolation kernels
pub trait TemporalInterpolator: Send + Sync {
    /// Interpolate between `window[index]` and `window[index + 1]` at `fraction` in `[0, 1)`
    fn interpolate(&self, window: &[f32], index: usize, fraction: f32) -> f32;

    /// Samples this kernel needs around `index`
    fn stencil(&self) -> Stencil;

    /// Get the name of this interpolation method
    fn name(&self) -> &str;
}

/// Get the kernel for a selector.
///
/// Selectors without an implementation fail instead of falling back to
/// another kernel.
pub fn get_interpolator(kind: Interpolation) -> Result<Box<dyn TemporalInterpolator>> {
    match kind {
        Interpolation::Linear => Ok(Box::new(linear::LinearInterpolator)),
        Interpolation::Hermite => Ok(Box::new(hermite::HermiteInterpolator)),
        Interpolation::Nearest
        | Interpolation::SolarBackwardsAveraged
        | Interpolation::HermiteBackwardsAveraged => {
            Err(PointcastError::UnimplementedInterpolation {
                interpolation: kind,
            })
        }
    }
}

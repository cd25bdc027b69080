//! Error types for the pointcast application.
//!
//! A point outside every grid is not an error: readers signal it with `None`.
//! Everything below is a genuine failure of a read, a request or the setup.

use thiserror::Error;

use crate::interpolation::Interpolation;

/// The main error type for pointcast operations.
#[derive(Error, Debug)]
pub enum PointcastError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Malformed time ranges
    #[error("Invalid time range: {message}")]
    InvalidTimeRange { message: String },

    /// Invalid parameter errors
    #[error("Invalid parameter: {param} - {message}")]
    InvalidParameter { param: String, message: String },

    /// Unknown domain or variable
    #[error("Data not found: {message}")]
    DataNotFound { message: String },

    /// A coarser step than the native cadence was requested
    #[error(
        "Unsupported cadence: requested step of {requested_dt}s is coarser than the native step of {native_dt}s"
    )]
    UnsupportedCadence { requested_dt: i64, native_dt: i64 },

    /// The variable selects a kernel without an implementation
    #[error("Interpolation '{interpolation}' is not implemented")]
    UnimplementedInterpolation { interpolation: Interpolation },

    /// Read failures reported by a time-series store
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Stored data does not have the expected shape
    #[error("Data integrity error: {message}")]
    DataIntegrity { message: String },

    /// Server errors
    #[error("Server error: {message}")]
    Server { message: String },
}

/// Convenience type alias for Results with PointcastError
pub type Result<T> = std::result::Result<T, PointcastError>;

//! # pointcast
//!
//! Point-location weather series read from chunked time-series stores.
//!
//! A request names a coordinate and a time range. The coordinate is resolved
//! to one grid cell of a domain, that cell's series is read at the domain's
//! native time step, and the series is resampled to the requested step.
//!
//! ## Architecture
//!
//! - **Time**: fixed-step half-open time ranges and their alignment arithmetic
//! - **Grid**: coordinate to grid-cell resolution
//! - **Storage**: the store trait and the chunk-file and in-memory stores
//! - **Reader**: grid resolution plus interpolated reads for one point
//! - **API Layer**: exposes point series through an HTTP API

pub mod config;
pub mod domain;
pub mod error;
pub mod grid;
pub mod handlers;
pub mod interpolation;
pub mod logging;
pub mod reader;
pub mod state;
pub mod storage;
pub mod time;

pub use config::Config;
pub use domain::{Domain, GenericDomain, GenericVariable, WeatherVariable};
pub use error::{PointcastError, Result};
pub use grid::{Grid, GridPoint, GridSelectionMode, RegularGrid};
pub use interpolation::Interpolation;
pub use logging::{
    create_http_trace_layer, generate_request_id, init_tracing, log_domain_stats, log_error,
    log_operation_end, log_operation_start, log_request_error, log_timed_operation,
};
pub use reader::GenericReader;
pub use state::AppState;
pub use storage::{MemoryStore, SplitFileStore, TimeSeriesStore};
pub use time::{TimeRange, Timestamp};

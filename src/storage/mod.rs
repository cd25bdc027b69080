//! Access to stored time series.
//!
//! Readers only talk to the [`TimeSeriesStore`] trait. Two stores ship with
//! the crate: [`SplitFileStore`] for chunk files on disk and [`MemoryStore`]
//! for series held in memory.

pub mod memory;
pub mod split_file;

pub use memory::MemoryStore;
pub use split_file::SplitFileStore;

use crate::error::Result;
use crate::time::TimeRange;

/// Trait for reading one location's series of a variable
///
/// Implementations must allow concurrent reads, including of overlapping
/// windows, without coordination by the caller.
pub trait TimeSeriesStore: Send + Sync {
    /// Read `time.len()` values at the store's native cadence. Missing samples are NaN.
    fn read(&self, variable: &str, location: usize, time: &TimeRange) -> Result<Vec<f32>>;

    /// Hint that `read` will soon be called with these arguments.
    ///
    /// Must return without waiting for I/O and must not fail; problems are
    /// logged by the store.
    fn will_need(&self, variable: &str, location: usize, time: &TimeRange);
}

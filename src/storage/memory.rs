//! In-memory time-series store.

use ndarray::Array2;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::TimeSeriesStore;
use crate::error::{PointcastError, Result};
use crate::time::{TimeRange, Timestamp};

/// One variable's data: `locations × time` at a fixed cadence from `start`
#[derive(Debug, Clone)]
struct Series {
    start: Timestamp,
    dt_seconds: i64,
    data: Array2<f32>,
}

/// Store keeping whole series in memory.
///
/// Instants outside a stored series, and unknown variables, read as NaN.
#[derive(Debug, Default)]
pub struct MemoryStore {
    series: RwLock<HashMap<String, Series>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` (`locations × time`) for `variable`, replacing any previous series
    pub fn insert(
        &self,
        variable: &str,
        start: Timestamp,
        dt_seconds: i64,
        data: Array2<f32>,
    ) -> Result<()> {
        if dt_seconds <= 0 {
            return Err(PointcastError::InvalidTimeRange {
                message: format!("Time step must be positive, got {}s", dt_seconds),
            });
        }
        self.series.write().insert(
            variable.to_string(),
            Series {
                start,
                dt_seconds,
                data,
            },
        );
        Ok(())
    }
}

impl TimeSeriesStore for MemoryStore {
    fn read(&self, variable: &str, location: usize, time: &TimeRange) -> Result<Vec<f32>> {
        let guard = self.series.read();
        let Some(series) = guard.get(variable) else {
            return Ok(vec![f32::NAN; time.len()]);
        };
        if location >= series.data.nrows() {
            return Err(PointcastError::Storage {
                message: format!(
                    "Location {} out of range for {} ({} locations)",
                    location,
                    variable,
                    series.data.nrows()
                ),
            });
        }
        if time.dt_seconds() != series.dt_seconds {
            return Err(PointcastError::Storage {
                message: format!(
                    "{} is stored every {}s, cannot read at {}s",
                    variable,
                    series.dt_seconds,
                    time.dt_seconds()
                ),
            });
        }

        let row = series.data.row(location);
        let values = time
            .iter()
            .map(|t| {
                let offset = t.seconds() - series.start.seconds();
                if offset < 0 {
                    return f32::NAN;
                }
                row.get((offset / series.dt_seconds) as usize)
                    .copied()
                    .unwrap_or(f32::NAN)
            })
            .collect();
        Ok(values)
    }

    fn will_need(&self, _variable: &str, _location: usize, _time: &TimeRange) {}
}

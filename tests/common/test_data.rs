//! Test data generation utilities.
//!
//! This module writes chunk-file stores with known data patterns and builds
//! matching configurations for testing the pointcast server.

use pointcast::config::{Config, DataConfig, DomainConfig, GridConfig, VariableConfig};
use pointcast::{Interpolation, Result, SplitFileStore, Timestamp};
use std::path::Path;

/// Native step of the generated domain
pub const DT_SECONDS: i64 = 3600;

/// Native steps per chunk file
pub const FILE_LENGTH: usize = 24;

/// First stored instant, aligned to a chunk boundary
pub const START: &str = "2024-01-15T00:00";

/// Grid: 3×2 cells at one degree spacing from (47, 8)
pub const NX: usize = 3;
pub const NY: usize = 2;

/// Value of the linear ramp at a location and step since `START`
pub fn ramp_value(location: usize, step: usize) -> f32 {
    location as f32 * 100.0 + step as f32
}

/// Write `n_chunks` chunk files of `variable` starting at `START`, filled by `value(location, step)`.
pub fn write_series(
    store: &SplitFileStore,
    variable: &str,
    n_chunks: usize,
    value: impl Fn(usize, usize) -> f32,
) -> Result<()> {
    let start = Timestamp::parse_iso8601(START)?;
    let first_chunk = start.seconds() / DT_SECONDS / FILE_LENGTH as i64;
    let n_locations = NX * NY;

    for c in 0..n_chunks {
        let mut values = Vec::with_capacity(n_locations * FILE_LENGTH);
        for location in 0..n_locations {
            for offset in 0..FILE_LENGTH {
                values.push(value(location, c * FILE_LENGTH + offset));
            }
        }
        store.write_chunk(variable, first_chunk + c as i64, &values)?;
    }
    Ok(())
}

/// Create a store under `dir` holding two days of `temperature_2m` as a linear ramp
/// and two days of `cloud_cover` as a constant 50.
pub fn create_test_store(dir: &Path) -> Result<()> {
    let store = SplitFileStore::new(dir, NX * NY, FILE_LENGTH, DT_SECONDS, 4)?;
    write_series(&store, "temperature_2m", 2, ramp_value)?;
    write_series(&store, "cloud_cover", 2, |_, _| 50.0)?;
    Ok(())
}

/// Configuration serving the store created by `create_test_store`
pub fn test_config(dir: &Path, port: u16) -> Config {
    let mut config = Config::default();
    config.server.port = port;
    config.server.workers = Some(1);
    config.data = DataConfig {
        cache_chunks: 8,
        domains: vec![DomainConfig {
            name: "test".to_string(),
            dt_seconds: DT_SECONDS,
            om_file_length: FILE_LENGTH,
            directory: dir.to_path_buf(),
            grid: GridConfig {
                nx: NX,
                ny: NY,
                lat_min: 47.0,
                lon_min: 8.0,
                dx: 1.0,
                dy: 1.0,
            },
            elevation_file: None,
        }],
        variables: vec![
            VariableConfig {
                name: "temperature_2m".to_string(),
                scalefactor: 20.0,
                interpolation: Interpolation::Linear,
            },
            VariableConfig {
                name: "cloud_cover".to_string(),
                scalefactor: 1.0,
                interpolation: Interpolation::Hermite,
            },
        ],
    };
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointcast::{TimeRange, TimeSeriesStore};
    use tempfile::tempdir;

    #[test]
    fn test_create_test_store() {
        let dir = tempdir().unwrap();
        create_test_store(dir.path()).unwrap();
        assert!(dir.path().join("temperature_2m").is_dir());
        assert!(dir.path().join("cloud_cover").is_dir());
    }

    #[test]
    fn test_ramp_spans_chunks() {
        let dir = tempdir().unwrap();
        create_test_store(dir.path()).unwrap();
        let store = SplitFileStore::new(dir.path(), NX * NY, FILE_LENGTH, DT_SECONDS, 4).unwrap();

        let start = Timestamp::parse_iso8601("2024-01-15T22:00").unwrap();
        let time = TimeRange::new(start, start.plus(4 * DT_SECONDS), DT_SECONDS).unwrap();
        let values = store.read("temperature_2m", 4, &time).unwrap();
        assert_eq!(values, vec![422.0, 423.0, 424.0, 425.0]);
    }

    #[test]
    fn test_config_is_valid() {
        let dir = tempdir().unwrap();
        assert!(test_config(dir.path(), 9000).validate().is_ok());
    }
}

//! Domains (one gridded dataset each) and the variables read from them.
//!
//! The reader is generic over [`GenericDomain`] and [`GenericVariable`], so
//! any dataset and any variable description can be plugged in. [`Domain`]
//! and [`WeatherVariable`] are the configuration-driven implementations.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::grid::{Grid, RegularGrid};
use crate::interpolation::Interpolation;
use crate::storage::TimeSeriesStore;

/// What a reader needs to know about a dataset
pub trait GenericDomain: Send + Sync {
    /// Grid used to resolve coordinates
    fn grid(&self) -> &dyn Grid;

    /// Native time step of the stored series, e.g. 3600 for hourly data
    fn dt_seconds(&self) -> i64;

    /// Where the series are read from
    fn store(&self) -> &dyn TimeSeriesStore;
}

/// What a reader needs to know about a variable
pub trait GenericVariable {
    /// Name of the variable in the store, e.g. `temperature_2m`
    fn om_file_name(&self) -> &str;

    /// Values are stored as `round(value * scalefactor)`
    fn scalefactor(&self) -> f32;

    /// Kernel used to reach a finer time step than stored
    fn interpolation(&self) -> Interpolation;
}

/// A dataset on a regular grid backed by a time-series store
pub struct Domain {
    name: String,
    grid: RegularGrid,
    dt_seconds: i64,
    directory: PathBuf,
    om_file_length: usize,
    store: Arc<dyn TimeSeriesStore>,
}

impl Domain {
    pub fn new(
        name: impl Into<String>,
        grid: RegularGrid,
        dt_seconds: i64,
        directory: impl Into<PathBuf>,
        om_file_length: usize,
        store: Arc<dyn TimeSeriesStore>,
    ) -> Self {
        Self {
            name: name.into(),
            grid,
            dt_seconds,
            directory: directory.into(),
            om_file_length,
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn regular_grid(&self) -> &RegularGrid {
        &self.grid
    }

    /// Directory holding the chunk files
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Native steps per chunk file
    pub fn om_file_length(&self) -> usize {
        self.om_file_length
    }

    pub fn info(&self) -> DomainInfo {
        DomainInfo {
            name: self.name().to_string(),
            dt_seconds: self.dt_seconds,
            locations: self.grid.count(),
            om_file_length: self.om_file_length(),
            directory: self.directory().display().to_string(),
        }
    }
}

impl std::fmt::Debug for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Domain")
            .field("name", &self.name)
            .field("dt_seconds", &self.dt_seconds)
            .field("directory", &self.directory)
            .field("om_file_length", &self.om_file_length)
            .finish_non_exhaustive()
    }
}

impl GenericDomain for Domain {
    fn grid(&self) -> &dyn Grid {
        &self.grid
    }

    fn dt_seconds(&self) -> i64 {
        self.dt_seconds
    }

    fn store(&self) -> &dyn TimeSeriesStore {
        self.store.as_ref()
    }
}

/// Summary of a domain for status endpoints
#[derive(Debug, Clone, Serialize)]
pub struct DomainInfo {
    pub name: String,
    pub dt_seconds: i64,
    pub locations: usize,
    pub om_file_length: usize,
    pub directory: String,
}

/// A variable as configured
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherVariable {
    pub name: String,
    pub scalefactor: f32,
    pub interpolation: Interpolation,
}

impl WeatherVariable {
    pub fn new(name: impl Into<String>, scalefactor: f32, interpolation: Interpolation) -> Self {
        Self {
            name: name.into(),
            scalefactor,
            interpolation,
        }
    }
}

impl GenericVariable for WeatherVariable {
    fn om_file_name(&self) -> &str {
        &self.name
    }

    fn scalefactor(&self) -> f32 {
        self.scalefactor
    }

    fn interpolation(&self) -> Interpolation {
        self.interpolation
    }
}

//! Application state management for pointcast.
//!
//! This module defines the shared state that is passed to all handlers:
//! the configured domains with their stores, and the variables.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::config::{Config, DomainConfig};
use crate::domain::{Domain, WeatherVariable};
use crate::error::{PointcastError, Result};
use crate::grid::{Grid, RegularGrid};
use crate::logging::log_domain_stats;
use crate::storage::SplitFileStore;

/// The main application state shared across all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Configuration
    pub config: Config,
    /// Domains by name
    pub domains: HashMap<String, Arc<Domain>>,
    /// Variables by name
    pub variables: HashMap<String, WeatherVariable>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(
        config: Config,
        domains: HashMap<String, Arc<Domain>>,
        variables: HashMap<String, WeatherVariable>,
    ) -> Self {
        Self {
            config,
            domains,
            variables,
        }
    }

    /// Open every configured domain
    pub fn from_config(config: Config) -> Result<Self> {
        let mut domains = HashMap::new();
        for domain_config in &config.data.domains {
            let domain = open_domain(domain_config, config.data.cache_chunks)?;
            domains.insert(domain_config.name.clone(), Arc::new(domain));
        }

        let variables = config
            .data
            .variables
            .iter()
            .map(|v| {
                (
                    v.name.clone(),
                    WeatherVariable::new(v.name.clone(), v.scalefactor, v.interpolation),
                )
            })
            .collect();

        Ok(Self::new(config, domains, variables))
    }

    /// Create a new AppState wrapped in an Arc for shared ownership
    pub fn from_config_shared(config: Config) -> Result<Arc<Self>> {
        Ok(Arc::new(Self::from_config(config)?))
    }

    /// Get a domain with error handling
    pub fn get_domain_checked(&self, name: &str) -> Result<&Arc<Domain>> {
        self.domains.get(name).ok_or_else(|| PointcastError::DataNotFound {
            message: format!("Domain not found: {}", name),
        })
    }

    /// Get a variable with error handling
    pub fn get_variable_checked(&self, name: &str) -> Result<&WeatherVariable> {
        self.variables
            .get(name)
            .ok_or_else(|| PointcastError::DataNotFound {
                message: format!("Variable not found: {}", name),
            })
    }

    /// Validate that the application state is consistent and ready for use
    pub fn validate(&self) -> Result<()> {
        if self.domains.is_empty() {
            return Err(PointcastError::DataNotFound {
                message: "No domains configured".to_string(),
            });
        }
        if self.variables.is_empty() {
            return Err(PointcastError::DataNotFound {
                message: "No variables configured".to_string(),
            });
        }
        Ok(())
    }
}

/// Build a domain and its chunk-file store from configuration
pub fn open_domain(config: &DomainConfig, cache_chunks: usize) -> Result<Domain> {
    let g = &config.grid;
    let mut grid = RegularGrid::new(g.nx, g.ny, g.lat_min, g.lon_min, g.dx, g.dy);
    if let Some(path) = &config.elevation_file {
        grid = grid.load_elevation(path).map_err(|e| PointcastError::Config {
            message: format!("Domain {}: cannot load elevation: {}", config.name, e),
        })?;
        info!(domain = %config.name, path = %path.display(), "Loaded elevation");
    }

    let store = SplitFileStore::new(
        &config.directory,
        grid.count(),
        config.om_file_length,
        config.dt_seconds,
        cache_chunks,
    )?;

    log_domain_stats(
        &config.name,
        config.dt_seconds,
        grid.count(),
        config.om_file_length,
        &config.directory.display().to_string(),
    );

    Ok(Domain::new(
        config.name.clone(),
        grid,
        config.dt_seconds,
        config.directory.clone(),
        config.om_file_length,
        Arc::new(store),
    ))
}

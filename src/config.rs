//! Configuration management for pointcast.
//!
//! This module handles the layered configuration system with the following precedence:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. JSON config file
//! 4. Default values (lowest priority)
//!
//! Domains and variables only come from the JSON file. Everything a request
//! cannot fix on its own (cadences, scale factors, kernels) is validated here
//! so misconfiguration is caught at startup.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{PointcastError, Result};
use crate::interpolation::Interpolation;

/// Command-line arguments for pointcast
#[derive(Parser, Debug)]
#[command(name = "pointcast")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the JSON configuration file describing domains and variables
    pub config: PathBuf,

    /// Host address to bind to
    #[arg(short = 'H', long, env = "POINTCAST_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "POINTCAST_PORT")]
    pub port: Option<u16>,

    /// Number of worker threads
    #[arg(short, long, env = "POINTCAST_WORKERS")]
    pub workers: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "POINTCAST_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads (None = number of CPU cores)
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Regular latitude/longitude grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub nx: usize,
    pub ny: usize,
    pub lat_min: f32,
    pub lon_min: f32,
    pub dx: f32,
    pub dy: f32,
}

/// One dataset stored as chunk files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Name used in requests, e.g. `icon_d2`
    pub name: String,

    /// Native time step of the stored series in seconds
    pub dt_seconds: i64,

    /// Native steps per chunk file
    pub om_file_length: usize,

    /// Directory holding `<variable>/chunk_<n>.bin` files
    pub directory: PathBuf,

    pub grid: GridConfig,

    /// Raw little-endian `f32` elevation, `ny × nx`
    #[serde(default)]
    pub elevation_file: Option<PathBuf>,
}

/// One variable readable from every domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableConfig {
    pub name: String,

    /// Values are stored as `round(value * scalefactor)`
    pub scalefactor: f32,

    #[serde(default = "default_interpolation")]
    pub interpolation: Interpolation,
}

/// Data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Chunk files kept in memory per domain
    #[serde(default = "default_cache_chunks")]
    pub cache_chunks: usize,

    #[serde(default)]
    pub domains: Vec<DomainConfig>,

    #[serde(default)]
    pub variables: Vec<VariableConfig>,
}

/// Complete configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Data configuration
    #[serde(default)]
    pub data: DataConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with proper precedence
    pub fn load() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Build the configuration from already parsed arguments
    pub fn from_args(args: Args) -> Result<Self> {
        let mut config = Config::default();
        config.merge(Self::load_from_file(&args.config)?);

        // clap has already folded environment variables into the arguments
        if let Some(host) = args.host {
            config.server.host = host;
        }
        if let Some(port) = args.port {
            config.server.port = port;
        }
        if args.workers.is_some() {
            config.server.workers = args.workers;
        }
        if let Some(log_level) = args.log_level {
            config.log_level = log_level;
        }

        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PointcastError::Config {
            message: format!("Cannot read {}: {}", path.display(), e),
        })?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        self.server.host = other.server.host;
        self.server.port = other.server.port;
        if other.server.workers.is_some() {
            self.server.workers = other.server.workers;
        }
        self.data = other.data;
        self.log_level = other.log_level;
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(config_error("Server host cannot be empty"));
        }

        if self.server.port == 0 {
            return Err(config_error("Server port cannot be 0"));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(config_error(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.log_level
                )));
            }
        }

        if self.data.cache_chunks == 0 {
            return Err(config_error("cache_chunks must be at least 1"));
        }

        if self.data.domains.is_empty() {
            return Err(config_error("At least one domain must be configured"));
        }
        let mut names = HashSet::new();
        for domain in &self.data.domains {
            if !names.insert(domain.name.as_str()) {
                return Err(config_error(format!("Duplicate domain: {}", domain.name)));
            }
            domain.validate()?;
        }

        let mut names = HashSet::new();
        for variable in &self.data.variables {
            if !names.insert(variable.name.as_str()) {
                return Err(config_error(format!("Duplicate variable: {}", variable.name)));
            }
            variable.validate()?;
        }

        Ok(())
    }
}

impl DomainConfig {
    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(config_error("Domain name cannot be empty"));
        }
        if self.dt_seconds <= 0 {
            return Err(config_error(format!(
                "Domain {}: dt_seconds must be positive, got {}",
                self.name, self.dt_seconds
            )));
        }
        if self.om_file_length == 0 {
            return Err(config_error(format!(
                "Domain {}: om_file_length must be positive",
                self.name
            )));
        }
        let grid = &self.grid;
        if grid.nx == 0 || grid.ny == 0 {
            return Err(config_error(format!("Domain {}: grid has no cells", self.name)));
        }
        if !(grid.dx > 0.0 && grid.dy > 0.0) {
            return Err(config_error(format!(
                "Domain {}: grid spacing must be positive",
                self.name
            )));
        }
        Ok(())
    }
}

impl VariableConfig {
    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(config_error("Variable name cannot be empty"));
        }
        if !(self.scalefactor.is_finite() && self.scalefactor > 0.0) {
            return Err(config_error(format!(
                "Variable {}: scalefactor must be positive, got {}",
                self.name, self.scalefactor
            )));
        }
        if !self.interpolation.is_implemented() {
            return Err(config_error(format!(
                "Variable {}: interpolation '{}' is not implemented. Use linear or hermite",
                self.name, self.interpolation
            )));
        }
        Ok(())
    }
}

fn config_error(message: impl Into<String>) -> PointcastError {
    PointcastError::Config {
        message: message.into(),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            data: DataConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            cache_chunks: default_cache_chunks(),
            domains: Vec::new(),
            variables: Vec::new(),
        }
    }
}

// Default value functions for serde
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_interpolation() -> Interpolation {
    Interpolation::Hermite
}

fn default_cache_chunks() -> usize {
    64
}

fn default_log_level() -> String {
    "info".to_string()
}

//! Grid-point resolution.
//!
//! A [`Grid`] maps a coordinate to the index of the cell whose series is read
//! from storage. [`RegularGrid`] covers plain latitude/longitude grids with an
//! optional elevation and land/sea field.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{PointcastError, Result};

/// Elevation at or below this value marks a sea cell
pub const SEA_ELEVATION: f32 = -999.0;

/// How a grid cell is picked when elevation or land/sea status matters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GridSelectionMode {
    /// Closest cell, whatever it is
    Nearest,
    /// Closest land cell
    #[default]
    Land,
    /// Closest sea cell
    Sea,
    /// Land cell whose elevation best matches the requested elevation
    TerrainOptimised,
}

impl GridSelectionMode {
    pub const ALL: [GridSelectionMode; 4] = [
        GridSelectionMode::Nearest,
        GridSelectionMode::Land,
        GridSelectionMode::Sea,
        GridSelectionMode::TerrainOptimised,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GridSelectionMode::Nearest => "nearest",
            GridSelectionMode::Land => "land",
            GridSelectionMode::Sea => "sea",
            GridSelectionMode::TerrainOptimised => "terrain_optimised",
        }
    }
}

impl fmt::Display for GridSelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GridSelectionMode {
    type Err = PointcastError;

    fn from_str(s: &str) -> Result<Self> {
        GridSelectionMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s.to_lowercase())
            .ok_or_else(|| PointcastError::InvalidParameter {
                param: "cell_selection".to_string(),
                message: format!("Unknown cell selection: {}", s),
            })
    }
}

/// A resolved grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridPoint {
    /// Location index in the time-series store
    pub grid_index: usize,
    /// Elevation of the cell, NaN if unknown
    pub elevation: f32,
    /// Latitude of the cell centre
    pub latitude: f32,
    /// Longitude of the cell centre
    pub longitude: f32,
}

/// Trait for grid-point lookups
pub trait Grid: Send + Sync {
    /// Number of cells, i.e. locations in the store
    fn count(&self) -> usize;

    /// Cell centre `(latitude, longitude)` of a grid index
    fn coordinates(&self, grid_index: usize) -> (f32, f32);

    /// Resolve a coordinate. `None` when it is outside the grid or the mode rejects every candidate.
    fn find_point(
        &self,
        lat: f32,
        lon: f32,
        elevation: f32,
        mode: GridSelectionMode,
    ) -> Option<GridPoint>;
}

/// Regular latitude/longitude grid, row-major from `(lat_min, lon_min)`
#[derive(Debug, Clone)]
pub struct RegularGrid {
    nx: usize,
    ny: usize,
    lat_min: f32,
    lon_min: f32,
    dx: f32,
    dy: f32,
    /// `ny × nx` elevation, sea cells at or below [`SEA_ELEVATION`]
    elevation: Option<Array2<f32>>,
}

impl RegularGrid {
    pub fn new(nx: usize, ny: usize, lat_min: f32, lon_min: f32, dx: f32, dy: f32) -> Self {
        Self {
            nx,
            ny,
            lat_min,
            lon_min,
            dx,
            dy,
            elevation: None,
        }
    }

    /// Attach an elevation field. Its shape must be `(ny, nx)`.
    pub fn with_elevation(mut self, elevation: Array2<f32>) -> Result<Self> {
        if elevation.dim() != (self.ny, self.nx) {
            return Err(PointcastError::DataIntegrity {
                message: format!(
                    "Elevation shape {:?} does not match grid ({}, {})",
                    elevation.dim(),
                    self.ny,
                    self.nx
                ),
            });
        }
        self.elevation = Some(elevation);
        Ok(self)
    }

    /// Read an elevation field stored as raw little-endian `f32`
    pub fn load_elevation(self, path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let expected = self.nx * self.ny * 4;
        if bytes.len() != expected {
            return Err(PointcastError::DataIntegrity {
                message: format!(
                    "Elevation file {} has {} bytes, expected {}",
                    path.display(),
                    bytes.len(),
                    expected
                ),
            });
        }
        let values: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        let field = Array2::from_shape_vec((self.ny, self.nx), values).map_err(|e| {
            PointcastError::DataIntegrity {
                message: format!("Invalid elevation field: {}", e),
            }
        })?;
        self.with_elevation(field)
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    fn elevation_at(&self, x: usize, y: usize) -> f32 {
        self.elevation
            .as_ref()
            .map_or(f32::NAN, |field| field[[y, x]])
    }

    fn is_sea(&self, x: usize, y: usize) -> bool {
        match &self.elevation {
            Some(field) => {
                let elevation = field[[y, x]];
                elevation.is_nan() || elevation <= SEA_ELEVATION
            }
            None => false,
        }
    }

    /// Nearest cell `(x, y)`, `None` if the coordinate lies outside the grid
    fn nearest_cell(&self, lat: f32, lon: f32) -> Option<(usize, usize)> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        let x = ((lon - self.lon_min) / self.dx).round();
        let y = ((lat - self.lat_min) / self.dy).round();
        if x < 0.0 || y < 0.0 || x >= self.nx as f32 || y >= self.ny as f32 {
            return None;
        }
        Some((x as usize, y as usize))
    }

    /// The 3×3 neighbourhood of `(x, y)` clipped to the grid
    fn neighbourhood(&self, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        let ys = y.saturating_sub(1)..=(y + 1).min(self.ny - 1);
        ys.flat_map(move |yy| {
            let xs = x.saturating_sub(1)..=(x + 1).min(self.nx - 1);
            xs.map(move |xx| (xx, yy))
        })
    }

    fn distance2(&self, lat: f32, lon: f32, x: usize, y: usize) -> f32 {
        let (cell_lat, cell_lon) = self.cell_centre(x, y);
        (cell_lat - lat).powi(2) + (cell_lon - lon).powi(2)
    }

    fn cell_centre(&self, x: usize, y: usize) -> (f32, f32) {
        (
            self.lat_min + y as f32 * self.dy,
            self.lon_min + x as f32 * self.dx,
        )
    }

    fn closest_matching<F>(&self, lat: f32, lon: f32, x: usize, y: usize, accept: F) -> Option<(usize, usize)>
    where
        F: Fn(usize, usize) -> bool,
    {
        self.neighbourhood(x, y)
            .filter(|&(xx, yy)| accept(xx, yy))
            .min_by(|&(x1, y1), &(x2, y2)| {
                self.distance2(lat, lon, x1, y1)
                    .total_cmp(&self.distance2(lat, lon, x2, y2))
            })
    }
}

impl Grid for RegularGrid {
    fn count(&self) -> usize {
        self.nx * self.ny
    }

    fn coordinates(&self, grid_index: usize) -> (f32, f32) {
        self.cell_centre(grid_index % self.nx, grid_index / self.nx)
    }

    fn find_point(
        &self,
        lat: f32,
        lon: f32,
        elevation: f32,
        mode: GridSelectionMode,
    ) -> Option<GridPoint> {
        let (x, y) = self.nearest_cell(lat, lon)?;

        let (x, y) = match mode {
            GridSelectionMode::Nearest => (x, y),
            GridSelectionMode::Land => {
                self.closest_matching(lat, lon, x, y, |xx, yy| !self.is_sea(xx, yy))?
            }
            GridSelectionMode::Sea => {
                self.closest_matching(lat, lon, x, y, |xx, yy| self.is_sea(xx, yy))?
            }
            GridSelectionMode::TerrainOptimised if elevation.is_nan() => {
                self.closest_matching(lat, lon, x, y, |xx, yy| !self.is_sea(xx, yy))?
            }
            GridSelectionMode::TerrainOptimised => self
                .neighbourhood(x, y)
                .filter(|&(xx, yy)| !self.is_sea(xx, yy))
                .min_by(|&(x1, y1), &(x2, y2)| {
                    let d1 = (self.elevation_at(x1, y1) - elevation).abs();
                    let d2 = (self.elevation_at(x2, y2) - elevation).abs();
                    d1.total_cmp(&d2).then_with(|| {
                        self.distance2(lat, lon, x1, y1)
                            .total_cmp(&self.distance2(lat, lon, x2, y2))
                    })
                })?,
        };

        let (latitude, longitude) = self.cell_centre(x, y);
        Some(GridPoint {
            grid_index: y * self.nx + x,
            elevation: self.elevation_at(x, y),
            latitude,
            longitude,
        })
    }
}

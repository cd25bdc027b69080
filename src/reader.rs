//! Point reader: one grid cell of one domain over a requested time range.
//!
//! The reader resolves its grid cell once, then serves any number of
//! variables. When the requested step is finer than the domain's native step,
//! only the native window covering the kernel stencil is read and the series
//! is interpolated to the requested instants.

use std::marker::PhantomData;
use tracing::debug;

use crate::domain::{GenericDomain, GenericVariable};
use crate::error::{PointcastError, Result};
use crate::grid::{GridPoint, GridSelectionMode};
use crate::interpolation::common::{fraction, quantize};
use crate::interpolation::{get_interpolator, TemporalInterpolator};
use crate::time::TimeRange;

/// Reads series of `V` variables at one resolved grid cell of a `D` domain
#[derive(Debug)]
pub struct GenericReader<'a, D: GenericDomain, V: GenericVariable> {
    /// Reference to the domain
    domain: &'a D,
    /// Resolved grid cell
    point: GridPoint,
    /// The requested instants and step
    time: TimeRange,
    _variable: PhantomData<fn(&V)>,
}

impl<'a, D: GenericDomain, V: GenericVariable> Clone for GenericReader<'a, D, V> {
    fn clone(&self) -> Self {
        Self {
            domain: self.domain,
            point: self.point,
            time: self.time,
            _variable: PhantomData,
        }
    }
}

impl<'a, D: GenericDomain, V: GenericVariable> GenericReader<'a, D, V> {
    /// Resolve the grid cell for a coordinate.
    ///
    /// Returns `None` if the coordinate is outside the domain or rejected by
    /// `mode`. Does no I/O.
    pub fn new(
        domain: &'a D,
        lat: f32,
        lon: f32,
        elevation: f32,
        mode: GridSelectionMode,
        time: TimeRange,
    ) -> Option<Self> {
        let point = domain.grid().find_point(lat, lon, elevation, mode)?;
        Some(Self {
            domain,
            point,
            time,
            _variable: PhantomData,
        })
    }

    /// Grid index in the store
    pub fn position(&self) -> usize {
        self.point.grid_index
    }

    pub fn model_elevation(&self) -> f32 {
        self.point.elevation
    }

    pub fn model_lat(&self) -> f32 {
        self.point.latitude
    }

    pub fn model_lon(&self) -> f32 {
        self.point.longitude
    }

    pub fn time(&self) -> &TimeRange {
        &self.time
    }

    /// Native-cadence window `get` reads for this kernel.
    ///
    /// The requested range is snapped onto the native step, then extended so
    /// every requested instant has its full stencil inside the window.
    pub fn native_window(&self, kernel: &dyn TemporalInterpolator) -> TimeRange {
        let native_dt = self.domain.dt_seconds();
        let stencil = kernel.stencil();
        self.time.align_to(native_dt).extend(
            native_dt * stencil.before as i64,
            native_dt * stencil.after as i64,
        )
    }

    fn check_cadence(&self) -> Result<()> {
        let native_dt = self.domain.dt_seconds();
        if self.time.dt_seconds() > native_dt {
            return Err(PointcastError::UnsupportedCadence {
                requested_dt: self.time.dt_seconds(),
                native_dt,
            });
        }
        Ok(())
    }

    /// The exact range `get` would read for `variable`
    fn read_range(&self, variable: &V) -> Result<TimeRange> {
        if self.time.dt_seconds() == self.domain.dt_seconds() {
            return Ok(self.time);
        }
        self.check_cadence()?;
        let kernel = get_interpolator(variable.interpolation())?;
        Ok(self.native_window(kernel.as_ref()))
    }

    /// Ask the store to start loading what `get(variable)` will read.
    ///
    /// Never fails and never blocks on I/O.
    pub fn prefetch_data(&self, variable: &V) {
        match self.read_range(variable) {
            Ok(range) => {
                self.domain
                    .store()
                    .will_need(variable.om_file_name(), self.point.grid_index, &range)
            }
            Err(e) => debug!(
                variable = variable.om_file_name(),
                error = %e,
                "Skipping prefetch"
            ),
        }
    }

    /// Read `variable` at the requested instants.
    ///
    /// Returns exactly `time.len()` values. Series stored at the requested
    /// step are returned as read; finer steps are interpolated and rounded
    /// to the variable's stored precision. Coarser steps are rejected.
    pub fn get(&self, variable: &V) -> Result<Vec<f32>> {
        let native_dt = self.domain.dt_seconds();
        let store = self.domain.store();
        let name = variable.om_file_name();

        if self.time.dt_seconds() == native_dt {
            return store.read(name, self.point.grid_index, &self.time);
        }
        self.check_cadence()?;

        let kernel = get_interpolator(variable.interpolation())?;
        let window = self.native_window(kernel.as_ref());
        debug!(
            variable = name,
            interpolation = kernel.name(),
            requested = %self.time,
            window = %window,
            "Reading native window"
        );

        let samples = store.read(name, self.point.grid_index, &window)?;
        if samples.len() != window.len() {
            return Err(PointcastError::DataIntegrity {
                message: format!(
                    "Store returned {} values for {}, expected {}",
                    samples.len(),
                    window,
                    window.len()
                ),
            });
        }

        let scalefactor = variable.scalefactor();
        let mut data = Vec::with_capacity(self.time.len());
        for t in &self.time {
            let index = window
                .offset_of(t)
                .filter(|&index| index < samples.len())
                .ok_or_else(|| PointcastError::DataIntegrity {
                    message: format!("{} falls outside the native window {}", t, window),
                })?;
            let value = kernel.interpolate(&samples, index, fraction(t, native_dt));
            data.push(quantize(value, scalefactor));
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Domain, WeatherVariable};
    use crate::grid::RegularGrid;
    use crate::interpolation::Interpolation;
    use crate::storage::MemoryStore;
    use crate::time::Timestamp;
    use ndarray::Array2;
    use std::sync::Arc;

    fn hourly_domain(values: Vec<f32>) -> Domain {
        let store = MemoryStore::new();
        let n = values.len();
        store
            .insert(
                "temperature_2m",
                Timestamp(0),
                3600,
                Array2::from_shape_vec((1, n), values).unwrap(),
            )
            .unwrap();
        Domain::new(
            "test",
            RegularGrid::new(1, 1, 0.0, 0.0, 1.0, 1.0),
            3600,
            "/nonexistent",
            24,
            Arc::new(store),
        )
    }

    fn range(start_hour: f64, end_hour: f64, dt: i64) -> TimeRange {
        TimeRange::new(
            Timestamp((start_hour * 3600.0) as i64),
            Timestamp((end_hour * 3600.0) as i64),
            dt,
        )
        .unwrap()
    }

    #[test]
    fn test_out_of_domain_yields_no_reader() {
        let domain = hourly_domain(vec![1.0; 4]);
        let reader = GenericReader::<Domain, WeatherVariable>::new(
            &domain,
            60.0,
            60.0,
            f32::NAN,
            GridSelectionMode::Nearest,
            range(0.0, 1.0, 3600),
        );
        assert!(reader.is_none());
    }

    #[test]
    fn test_resolved_point_is_exposed() {
        let domain = hourly_domain(vec![1.0; 4]);
        let reader = GenericReader::<Domain, WeatherVariable>::new(
            &domain,
            0.2,
            -0.3,
            f32::NAN,
            GridSelectionMode::Land,
            range(0.0, 1.0, 3600),
        )
        .unwrap();
        assert_eq!(reader.position(), 0);
        assert_eq!((reader.model_lat(), reader.model_lon()), (0.0, 0.0));
        assert!(reader.model_elevation().is_nan());
    }

    #[test]
    fn test_linear_upsampling() {
        let domain = hourly_domain(vec![10.0, 20.0, 30.0]);
        let variable = WeatherVariable::new("temperature_2m", 1.0, Interpolation::Linear);
        let reader = GenericReader::new(
            &domain,
            0.0,
            0.0,
            f32::NAN,
            GridSelectionMode::Nearest,
            range(0.0, 2.5, 1800),
        )
        .unwrap();
        assert_eq!(reader.get(&variable).unwrap(), vec![10.0, 15.0, 20.0, 25.0, 30.0]);
    }

    #[test]
    fn test_coarser_step_is_rejected() {
        let domain = hourly_domain(vec![1.0; 6]);
        let variable = WeatherVariable::new("temperature_2m", 1.0, Interpolation::Linear);
        let reader = GenericReader::new(
            &domain,
            0.0,
            0.0,
            f32::NAN,
            GridSelectionMode::Nearest,
            range(0.0, 6.0, 10800),
        )
        .unwrap();
        assert!(matches!(
            reader.get(&variable),
            Err(PointcastError::UnsupportedCadence {
                requested_dt: 10800,
                native_dt: 3600
            })
        ));
        // Prefetch swallows the same condition
        reader.prefetch_data(&variable);
    }

    #[test]
    fn test_native_window_bounds() {
        let domain = hourly_domain(vec![]);
        let reader = GenericReader::<Domain, WeatherVariable>::new(
            &domain,
            0.0,
            0.0,
            f32::NAN,
            GridSelectionMode::Nearest,
            range(7.0, 9.0, 900),
        )
        .unwrap();

        let linear = get_interpolator(Interpolation::Linear).unwrap();
        let window = reader.native_window(linear.as_ref());
        assert_eq!((window.start(), window.end()), (Timestamp(7 * 3600), Timestamp(10 * 3600)));
        assert_eq!(window.len(), 3);

        let hermite = get_interpolator(Interpolation::Hermite).unwrap();
        let window = reader.native_window(hermite.as_ref());
        assert_eq!((window.start(), window.end()), (Timestamp(6 * 3600), Timestamp(11 * 3600)));
        assert_eq!(window.len(), 5);
    }
}

//! Point forecast endpoint handler.
//!
//! Returns the series of one or more variables at the grid cell closest to a
//! coordinate, resampled to the requested time step.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::domain::{Domain, GenericDomain, WeatherVariable};
use crate::error::{PointcastError, Result};
use crate::grid::GridSelectionMode;
use crate::logging::{generate_request_id, log_request_error, log_timed_operation};
use crate::reader::GenericReader;
use crate::state::AppState;
use crate::time::{TimeRange, Timestamp};

/// Upper bound on instants per request
pub const MAX_TIME_STEPS: usize = 10_000;

/// Query parameters for the forecast endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastQuery {
    pub latitude: f32,
    pub longitude: f32,
    /// Elevation used by terrain-optimised cell selection
    pub elevation: Option<f32>,
    /// Domain name
    pub domain: String,
    /// Comma-separated list of variables
    pub variables: String,
    /// First instant, ISO 8601
    pub start_time: String,
    /// Exclusive end, ISO 8601
    pub end_time: String,
    /// Step in seconds, defaults to the domain's native step
    pub time_step: Option<i64>,
    /// nearest, land, sea or terrain_optimised
    pub cell_selection: Option<String>,
}

/// Response for a forecast query
#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    /// Centre of the grid cell that was read
    pub latitude: f32,
    pub longitude: f32,
    /// Elevation of the grid cell, null when unknown
    pub elevation: f32,
    pub domain: String,
    pub time_step: i64,
    pub time: Vec<String>,
    /// One value per instant per variable, missing values as null
    pub values: BTreeMap<String, Vec<f32>>,
}

/// Handle GET /v1/forecast requests
pub async fn forecast_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ForecastQuery>,
) -> Response {
    let request_id = generate_request_id();
    let start_time = Instant::now();

    debug!(
        endpoint = "/v1/forecast",
        request_id = %request_id,
        params = ?params,
        "Processing forecast query"
    );

    let query = params.clone();
    let result = tokio::task::spawn_blocking(move || process_forecast(&state, &query))
        .await
        .map_err(|e| PointcastError::Server {
            message: format!("Forecast task failed: {}", e),
        })
        .and_then(|result| result);

    match result {
        Ok(Some(response)) => {
            info!(
                endpoint = "/v1/forecast",
                request_id = %request_id,
                domain = %response.domain,
                instants = response.time.len(),
                duration_us = start_time.elapsed().as_micros() as u64,
                "Forecast query successful"
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(None) => {
            debug!(
                endpoint = "/v1/forecast",
                request_id = %request_id,
                latitude = params.latitude,
                longitude = params.longitude,
                "Coordinate not covered by domain"
            );
            (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "error": "No data for this location",
                    "request_id": request_id
                })),
            )
                .into_response()
        }
        Err(error) => handle_forecast_error(error, &request_id, &params),
    }
}

/// HTTP status for a failed forecast query
pub fn error_status(error: &PointcastError) -> StatusCode {
    match error {
        PointcastError::InvalidParameter { .. } | PointcastError::InvalidTimeRange { .. } => {
            StatusCode::BAD_REQUEST
        }
        PointcastError::DataNotFound { .. } => StatusCode::NOT_FOUND,
        PointcastError::Storage { .. }
        | PointcastError::DataIntegrity { .. }
        | PointcastError::Io(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn handle_forecast_error(error: PointcastError, request_id: &str, params: &ForecastQuery) -> Response {
    log_request_error(
        &error,
        "/v1/forecast",
        request_id,
        Some(&format!(
            "domain={}, variables={}, lat={}, lon={}",
            params.domain, params.variables, params.latitude, params.longitude
        )),
    );

    (
        error_status(&error),
        Json(serde_json::json!({
            "error": error.to_string(),
            "request_id": request_id
        })),
    )
        .into_response()
}

fn invalid(param: &str, message: impl Into<String>) -> PointcastError {
    PointcastError::InvalidParameter {
        param: param.to_string(),
        message: message.into(),
    }
}

/// Run a forecast query. `Ok(None)` if the coordinate is not covered.
pub fn process_forecast(
    state: &AppState,
    params: &ForecastQuery,
) -> Result<Option<ForecastResponse>> {
    let domain = state.get_domain_checked(&params.domain)?;

    let variables: Vec<&WeatherVariable> = params
        .variables
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| state.get_variable_checked(name))
        .collect::<Result<_>>()?;
    if variables.is_empty() {
        return Err(invalid("variables", "At least one variable is required"));
    }

    let native_dt = domain.dt_seconds();
    let time_step = params.time_step.unwrap_or(native_dt);
    if time_step <= 0 {
        return Err(invalid("time_step", "Must be a positive number of seconds"));
    }
    if time_step > native_dt {
        return Err(invalid(
            "time_step",
            format!(
                "Must not exceed the {}s step of domain {}",
                native_dt, params.domain
            ),
        ));
    }

    let start = Timestamp::parse_iso8601(&params.start_time)?;
    let end = Timestamp::parse_iso8601(&params.end_time)?;
    let time = TimeRange::new(start, end, time_step)?;
    if time.len() > MAX_TIME_STEPS {
        return Err(invalid(
            "end_time",
            format!("At most {} time steps per request", MAX_TIME_STEPS),
        ));
    }

    let mode = match &params.cell_selection {
        Some(mode) => mode.parse::<GridSelectionMode>()?,
        None => GridSelectionMode::default(),
    };

    let Some(reader) = GenericReader::<Domain, WeatherVariable>::new(
        domain.as_ref(),
        params.latitude,
        params.longitude,
        params.elevation.unwrap_or(f32::NAN),
        mode,
        time,
    ) else {
        return Ok(None);
    };

    for variable in &variables {
        reader.prefetch_data(variable);
    }

    let mut values = BTreeMap::new();
    for variable in variables {
        let series = log_timed_operation("read_variable", || reader.get(variable))?;
        values.insert(variable.name.clone(), series);
    }

    Ok(Some(ForecastResponse {
        latitude: reader.model_lat(),
        longitude: reader.model_lon(),
        elevation: reader.model_elevation(),
        domain: params.domain.clone(),
        time_step,
        time: reader.time().iter().map(|t| t.iso8601()).collect(),
        values,
    }))
}

//! Heartbeat endpoint handler.
//!
//! Returns server status information: uptime and the configured domains and variables.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use crate::domain::{DomainInfo, WeatherVariable};
use crate::state::AppState;

/// Server ID, unique per process
static SERVER_ID: once_cell::sync::Lazy<String> =
    once_cell::sync::Lazy::new(|| Uuid::new_v4().to_string());

/// Server start time
static START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

/// Heartbeat response structure
#[derive(Serialize)]
pub struct HeartbeatResponse {
    /// Server ID (unique per instance)
    pub server_id: String,
    /// Current timestamp (ISO 8601 format)
    pub timestamp: String,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Configured domains
    pub domains: Vec<DomainInfo>,
    /// Configured variables
    pub variables: Vec<WeatherVariable>,
    /// Server status
    pub status: String,
}

/// Record the server start time. Called once at startup.
pub fn mark_started() {
    once_cell::sync::Lazy::force(&START_TIME);
}

/// Handle GET /heartbeat requests
pub async fn heartbeat_handler(State(state): State<Arc<AppState>>) -> Json<HeartbeatResponse> {
    let now = SystemTime::now();
    let timestamp = chrono::DateTime::<chrono::Utc>::from(now)
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    let uptime = now.duration_since(*START_TIME).unwrap_or(Duration::from_secs(0));

    let mut domains: Vec<DomainInfo> = state.domains.values().map(|d| d.info()).collect();
    domains.sort_by(|a, b| a.name.cmp(&b.name));
    let mut variables: Vec<WeatherVariable> = state.variables.values().cloned().collect();
    variables.sort_by(|a, b| a.name.cmp(&b.name));

    Json(HeartbeatResponse {
        server_id: SERVER_ID.clone(),
        timestamp,
        uptime_seconds: uptime.as_secs(),
        domains,
        variables,
        status: "healthy".to_string(),
    })
}

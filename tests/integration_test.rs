//! Integration tests for the pointcast server
//!
//! These tests verify that the server works correctly end-to-end, from chunk
//! files on disk to JSON over HTTP.

mod common;

use common::assertions::{assert_all_finite, assert_array_approx_eq};
use common::{http_client, test_data};
use once_cell::sync::OnceCell;
use pointcast::handlers::create_router;
use pointcast::AppState;
use reqwest::StatusCode;
use std::net::SocketAddr;

static TEST_SERVER: OnceCell<(SocketAddr, tempfile::TempDir)> = OnceCell::new();

/// Start the test server once, on its own runtime, so it outlives any single test
fn test_server() -> SocketAddr {
    let (addr, _dir) = TEST_SERVER.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        test_data::create_test_store(dir.path()).unwrap();

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        let config = test_data::test_config(dir.path(), addr.port());
        config.validate().unwrap();
        let state = AppState::from_config_shared(config).unwrap();
        let app = create_router(state);

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, app).await.unwrap();
            });
        });

        println!("Test server started on {}", addr);
        (addr, dir)
    });
    *addr
}

fn values(body: &serde_json::Value, variable: &str) -> Vec<f32> {
    body["values"][variable]
        .as_array()
        .unwrap_or_else(|| panic!("no values for {} in {}", variable, body))
        .iter()
        .map(|v| v.as_f64().map_or(f32::NAN, |v| v as f32))
        .collect()
}

#[tokio::test]
async fn test_forecast_at_native_step() {
    let addr = test_server();
    let (status, body) = http_client::get_status_json(
        &addr,
        "/v1/forecast?latitude=48.1&longitude=9.2&domain=test&variables=temperature_2m\
         &start_time=2024-01-15T10:00&end_time=2024-01-15T13:00&cell_selection=nearest",
    )
    .await
    .expect("Failed to make request");

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["time_step"], 3600);
    assert_eq!(body["latitude"], 48.0);
    assert_eq!(body["longitude"], 9.0);
    assert!(body["elevation"].is_null());
    assert_eq!(
        body["time"],
        serde_json::json!(["2024-01-15T10:00", "2024-01-15T11:00", "2024-01-15T12:00"])
    );
    assert_array_approx_eq(
        &values(&body, "temperature_2m"),
        &[410.0, 411.0, 412.0],
        None,
    );
}

#[tokio::test]
async fn test_forecast_upsampled() {
    let addr = test_server();
    let (status, body) = http_client::get_status_json(
        &addr,
        "/v1/forecast?latitude=48.1&longitude=9.2&domain=test\
         &variables=temperature_2m,cloud_cover&time_step=900\
         &start_time=2024-01-15T10:00&end_time=2024-01-15T11:00",
    )
    .await
    .expect("Failed to make request");

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["time"].as_array().map(Vec::len), Some(4));
    assert_array_approx_eq(
        &values(&body, "temperature_2m"),
        &[410.0, 410.25, 410.5, 410.75],
        Some(1e-4),
    );

    let cloud_cover = values(&body, "cloud_cover");
    assert_all_finite(&cloud_cover);
    assert_array_approx_eq(&cloud_cover, &[50.0, 50.0, 50.0, 50.0], None);
}

#[tokio::test]
async fn test_forecast_across_chunk_boundary() {
    let addr = test_server();
    let (status, body) = http_client::get_status_json(
        &addr,
        "/v1/forecast?latitude=47&longitude=8&domain=test&variables=temperature_2m\
         &time_step=1800&start_time=2024-01-15T23:00&end_time=2024-01-16T01:00",
    )
    .await
    .expect("Failed to make request");

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_array_approx_eq(
        &values(&body, "temperature_2m"),
        &[23.0, 23.5, 24.0, 24.5],
        Some(1e-4),
    );
}

#[tokio::test]
async fn test_forecast_beyond_stored_data_is_null() {
    let addr = test_server();
    let (status, body) = http_client::get_status_json(
        &addr,
        "/v1/forecast?latitude=47&longitude=8&domain=test&variables=temperature_2m\
         &start_time=2024-01-16T23:00&end_time=2024-01-17T01:00",
    )
    .await
    .expect("Failed to make request");

    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["values"]["temperature_2m"], serde_json::json!([47.0, null]));
}

#[tokio::test]
async fn test_forecast_uncovered_location() {
    let addr = test_server();
    let (status, body) = http_client::get_status_json(
        &addr,
        "/v1/forecast?latitude=10&longitude=8&domain=test&variables=temperature_2m\
         &start_time=2024-01-15T10:00&end_time=2024-01-15T13:00",
    )
    .await
    .expect("Failed to make request");

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No data for this location");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn test_forecast_bad_requests() {
    let addr = test_server();

    // Coarser than the native step
    let (status, _) = http_client::get_status_json(
        &addr,
        "/v1/forecast?latitude=47&longitude=8&domain=test&variables=temperature_2m\
         &time_step=7200&start_time=2024-01-15T10:00&end_time=2024-01-15T13:00",
    )
    .await
    .expect("Failed to make request");
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // End before start
    let (status, _) = http_client::get_status_json(
        &addr,
        "/v1/forecast?latitude=47&longitude=8&domain=test&variables=temperature_2m\
         &start_time=2024-01-15T13:00&end_time=2024-01-15T10:00",
    )
    .await
    .expect("Failed to make request");
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown variable
    let (status, body) = http_client::get_status_json(
        &addr,
        "/v1/forecast?latitude=47&longitude=8&domain=test&variables=snowfall\
         &start_time=2024-01-15T10:00&end_time=2024-01-15T13:00",
    )
    .await
    .expect("Failed to make request");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap_or_default().contains("snowfall"));
}

#[tokio::test]
async fn test_heartbeat_endpoint() {
    let addr = test_server();
    let body: serde_json::Value = http_client::get_json(&addr, "/heartbeat")
        .await
        .expect("Failed to get heartbeat");

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["domains"][0]["name"], "test");
    assert_eq!(body["domains"][0]["locations"], 6);
    assert!(body["domains"][0]["directory"].is_string());
    assert_eq!(body["variables"].as_array().map(Vec::len), Some(2));
    assert!(body["server_id"].is_string());
}

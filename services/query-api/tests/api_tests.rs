//! End-to-end tests of the HTTP API against a dataset written to a
//! temporary directory.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::Value;
use tower::ServiceExt;

use query_api::build_router;
use query_api::state::AppState;
use test_utils::{assert_approx_eq, assert_point_approx_eq, location, points, TempDataDir};
use zarr_dataset::storage::create_filesystem_storage;
use zarr_dataset::synthetic::value_at;
use zarr_dataset::time::parse_time;
use zarr_dataset::{synthetic_weather, DatasetWriter, FilesystemSource, SyntheticConfig, WriterConfig};

/// Write an 11×11×5 synthetic dataset (1° spacing) and serve it.
fn setup() -> (TempDataDir, Router) {
    let data = TempDataDir::new();
    let config = SyntheticConfig {
        lat_points: 11,
        lon_points: 11,
        days: 5,
        ..Default::default()
    };
    let definition =
        synthetic_weather(&config, parse_time("2024-01-01T00:00:00").unwrap()).unwrap();
    let store = create_filesystem_storage(data.path(), location::BUCKET, location::PATH, true)
        .expect("Failed to create store");
    DatasetWriter::new(WriterConfig::default())
        .write(store, &definition)
        .expect("Failed to write dataset");

    let state = AppState::new(Arc::new(FilesystemSource::new(data.path())));
    let router = build_router(Arc::new(state));
    (data, router)
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let (_data, router) = setup();
    let (status, body) = get(router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_health_unavailable_when_data_dir_missing() {
    let data = TempDataDir::new();
    let source = FilesystemSource::new(data.path().join("missing"));
    let router = build_router(Arc::new(AppState::new(Arc::new(source))));

    let (status, body) = get(router, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert!(body["detail"].as_str().unwrap().contains("does not exist"));
}

#[tokio::test]
async fn test_point_at_exact_grid_point() {
    let (_data, router) = setup();
    let (status, body) = get(
        router,
        "/data/testdata/weather.zarr?lat=33&lon=137&time=2023-01-03",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["latitude"], 33.0);
    assert_eq!(body["longitude"], 137.0);
    for name in ["temperature", "humidity", "pressure"] {
        assert_approx_eq!(
            body["values"][name].as_f64().unwrap(),
            value_at(name, 2, 33.0, 137.0).unwrap(),
            1e-9
        );
    }
}

#[tokio::test]
async fn test_time_series_without_time() {
    let (_data, router) = setup();
    let (lat, lon) = points::CENTER;
    let uri = format!(
        "/data/testdata/weather.zarr?lat={}&lon={}&variables=temperature",
        lat, lon
    );
    let (status, body) = get(router, &uri).await;

    assert_eq!(status, StatusCode::OK);
    let values = body["values"].as_object().unwrap();
    assert_eq!(values.len(), 1);

    let series = values["temperature"].as_object().unwrap();
    assert_eq!(series.len(), 5);
    assert!(series.contains_key("2023-01-01T00:00:00"));
    assert!(series.contains_key("2023-01-05T00:00:00"));
}

#[tokio::test]
async fn test_nearest_point_outside_grid() {
    let (_data, router) = setup();
    let (lat, lon) = points::OUTSIDE;
    let uri = format!("/data/testdata/weather.zarr?lat={}&lon={}&variables=pressure", lat, lon);
    let (status, body) = get(router, &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["latitude"], 30.0);
    assert_eq!(body["longitude"], 130.0);
}

#[tokio::test]
async fn test_unknown_variable_is_bad_request() {
    let (_data, router) = setup();
    let (status, body) = get(
        router,
        "/data/testdata/weather.zarr?lat=35&lon=135&variables=temperature,wind",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "Invalid variables: wind. Available variables are: humidity, pressure, temperature"
    );
}

#[tokio::test]
async fn test_empty_variable_list_is_bad_request() {
    let (_data, router) = setup();
    for query in ["variables=", "variables=temperature,"] {
        let uri = format!("/data/testdata/weather.zarr?lat=35&lon=135&{}", query);
        let (status, body) = get(router.clone(), &uri).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", query);
        assert_eq!(
            body["detail"],
            "Invalid variables: . Available variables are: humidity, pressure, temperature"
        );
    }
}

#[tokio::test]
async fn test_grid_corners() {
    let (_data, router) = setup();
    for (lat, lon) in [points::SW_CORNER, points::NE_CORNER] {
        let uri = format!("/data/testdata/weather.zarr?lat={}&lon={}&variables=pressure", lat, lon);
        let (status, body) = get(router.clone(), &uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_point_approx_eq!(
            (body["latitude"].as_f64().unwrap(), body["longitude"].as_f64().unwrap()),
            (lat, lon),
            1e-9
        );
        assert_eq!(body["values"]["pressure"].as_object().unwrap().len(), 5);
    }
}

#[tokio::test]
async fn test_bad_time_reported_in_variable_slot() {
    let (_data, router) = setup();
    let (status, body) = get(
        router,
        "/data/testdata/weather.zarr?lat=35&lon=135&variables=humidity&time=yesterday",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let message = body["values"]["humidity"].as_str().unwrap();
    assert!(message.starts_with("Failed to get data:"));
}

#[tokio::test]
async fn test_missing_or_invalid_coordinates() {
    let (_data, router) = setup();

    let (status, body) = get(router.clone(), "/data/testdata/weather.zarr?lon=135").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("lat"));

    let (status, _) = get(router.clone(), "/data/testdata/weather.zarr?lat=north&lon=135").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(router, "/data/testdata/weather.zarr?lat=NaN&lon=135").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_path_traversal_rejected() {
    let (_data, router) = setup();
    let (status, body) = get(router, "/data/testdata/a/../weather.zarr?lat=35&lon=135").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("invalid store path"));
}

#[tokio::test]
async fn test_nonexistent_dataset_is_server_error() {
    let (_data, router) = setup();

    let (status, body) = get(router.clone(), "/data/nobucket/weather.zarr?lat=35&lon=135").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["detail"].as_str().unwrap().is_empty());

    let (status, body) = get(router, "/metadata/testdata/missing.zarr").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["detail"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_metadata() {
    let (_data, router) = setup();
    let (status, body) = get(router, "/metadata/testdata/weather.zarr").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["variables"],
        serde_json::json!(["humidity", "pressure", "temperature"])
    );
    assert_eq!(body["dimensions"]["time"], 5);
    assert_eq!(body["dimensions"]["latitude"], 11);

    let coords = &body["coordinates"];
    assert_eq!(coords["latitude"]["min"], 30.0);
    assert_eq!(coords["latitude"]["max"], 40.0);
    assert_eq!(coords["longitude"]["min"], 130.0);
    assert_eq!(coords["longitude"]["max"], 140.0);
    assert_eq!(coords["time"]["start"], "2023-01-01T00:00:00");
    assert_eq!(coords["time"]["end"], "2023-01-05T00:00:00");

    assert_eq!(body["attributes"]["creator"], "Test Data Generator");
    assert_eq!(body["attributes"]["variables"]["temperature"], "Temperature (°C)");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (data, router) = setup();
    let (status, _) = get(router, "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let handle = PrometheusBuilder::new().build_recorder().handle();
    let state = AppState::new(Arc::new(FilesystemSource::new(data.path()))).with_metrics(handle);
    let response = build_router(Arc::new(state))
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
}

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use skyroute_core::AvoidanceMode;
use skyroute_model::VisibilityModel;

use crate::{api, config::Config, state::AppState};

/// Offline configuration: no AVWX token (built-in station table) and feed
/// URLs pointing at an unroutable port so fetches fail fast.
fn test_config(name: &str) -> Config {
    Config {
        server_port: 0,
        avwx_url: "http://127.0.0.1:9".to_string(),
        avwx_token: None,
        sigmet_url: "http://127.0.0.1:9".to_string(),
        openmeteo_url: "http://127.0.0.1:9".to_string(),
        http_timeout: Duration::from_millis(500),
        avoidance_mode: AvoidanceMode::Reroute,
        model_path: std::env::temp_dir()
            .join(format!("skyroute-test-{}-{}.json", name, std::process::id()))
            .to_string_lossy()
            .to_string(),
        station_cache_ttl: Duration::from_secs(60),
        history_cache_ttl: Duration::from_secs(60),
        history_retries: 0,
    }
}

fn setup_app(name: &str) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(test_config(name)));
    let app = api::routes()
        .route("/health", axum::routing::get(|| async { "OK" }))
        .with_state(state.clone());
    (app, state)
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _state) = setup_app("health");
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn offline_route_between_known_airports() {
    let (app, _state) = setup_app("route");

    // The SIGMET feed is unreachable in this setup, so the planner must
    // fail open to an empty hazard set and still reach a terminal state.
    let response = app
        .oneshot(json_request(
            "/api/calculate_route",
            json!({"origin_icao": "KJFK", "dest_icao": "EGLL"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["route_status"], "safe");
    assert_eq!(body["path"].as_array().unwrap().len(), 51);
    assert_eq!(body["storm_polygons"].as_array().unwrap().len(), 0);
    assert_eq!(body["weather"]["condition"], "SIMULATED");

    let first = body["path"][0].as_array().unwrap();
    assert!((first[0].as_f64().unwrap() - 40.6413).abs() < 1e-6);
    let distance = body["flight_data"]["distance_nm"].as_f64().unwrap();
    assert!(
        (2_990.0..=3_010.0).contains(&distance),
        "unexpected distance: {distance}"
    );
}

#[tokio::test]
async fn unknown_airport_is_reported_distinctly() {
    let (app, _state) = setup_app("unknown");

    let response = app
        .oneshot(json_request(
            "/api/calculate_route",
            json!({"origin_icao": "KJFK", "dest_icao": "ZZZZ"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = read_json(response).await;
    assert_eq!(body["error"], "Airport not found");
    assert_eq!(body["icao"], "ZZZZ");
}

#[tokio::test]
async fn empty_airport_codes_are_rejected() {
    let (app, _state) = setup_app("empty");

    let response = app
        .oneshot(json_request(
            "/api/calculate_route",
            json!({"origin_icao": "  ", "dest_icao": "EGLL"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn offline_weather_is_simulated() {
    let (app, _state) = setup_app("weather");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/weather/KJFK")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["condition"], "SIMULATED");
    assert_eq!(body["wind"], "000@00KT");
}

#[tokio::test]
async fn predict_without_model_conflicts() {
    let (app, _state) = setup_app("untrained");

    let response = app
        .oneshot(json_request(
            "/api/predict",
            json!({"temperature": 15.0, "humidity": 60.0, "wind": 12.0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = read_json(response).await;
    assert_eq!(body["error"], "No trained model available");
}

#[tokio::test]
async fn predict_uses_loaded_model() {
    let (app, state) = setup_app("predict");
    state.set_model(VisibilityModel {
        weights: [1_000.0, 10.0, -5.0, 2.0],
        trained_at: Utc::now(),
        samples: 100,
    });

    let response = app
        .oneshot(json_request(
            "/api/predict",
            json!({"temperature": 20.0, "humidity": 50.0, "wind": 10.0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    // 1000 + 10*20 - 5*50 + 2*10 = 970
    assert_eq!(body["predicted_visibility_m"].as_f64().unwrap(), 970.0);
}

#[tokio::test]
async fn train_with_unreachable_archive_is_bad_gateway() {
    let (app, _state) = setup_app("train");

    let response = app
        .oneshot(json_request(
            "/api/train",
            json!({"lat": 40.6413, "lon": -73.7781}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn train_rejects_out_of_range_coordinates() {
    let (app, _state) = setup_app("train-range");

    let response = app
        .oneshot(json_request("/api/train", json!({"lat": 95.0, "lon": 0.0})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = read_json(response).await;
    assert_eq!(body["field"], "lat");
}

//! REST API routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use skyroute_core::{RouteOutcome, WeatherReport};
use skyroute_feeds::FeedError;
use skyroute_model::{VisibilityModel, DEFAULT_TRAIN_SEED};

use crate::route_planner::{plan_flight, PlanFlightError};
use crate::state::AppState;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/calculate_route", post(calculate_route))
        .route("/api/weather/:icao", get(station_weather))
        .route("/api/train", post(train_model))
        .route("/api/predict", post(predict_visibility))
}

// === Request/Response types ===

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub origin_icao: String,
    pub dest_icao: String,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    /// Path as ordered [lat, lon] pairs.
    pub path: Vec<[f64; 2]>,
    pub weather: WeatherReport,
    /// Hazard polygons as lists of [lat, lon] vertices.
    pub storm_polygons: Vec<Vec<[f64; 2]>>,
    pub flight_data: FlightData,
    pub coords: EndpointCoords,
    pub route_status: RouteOutcome,
}

#[derive(Debug, Serialize)]
pub struct FlightData {
    pub distance_nm: f64,
    pub ete: String,
}

#[derive(Debug, Serialize)]
pub struct EndpointCoords {
    pub origin: [f64; 2],
    pub dest: [f64; 2],
}

#[derive(Debug, Deserialize)]
pub struct TrainRequest {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub status: String,
    pub accuracy_score: f64,
    pub samples: usize,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub temperature: f64,
    pub humidity: f64,
    pub wind: f64,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predicted_visibility_m: f64,
}

type ErrorResponse = (StatusCode, Json<serde_json::Value>);

// === Handlers ===

async fn calculate_route(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, ErrorResponse> {
    if req.origin_icao.trim().is_empty() || req.dest_icao.trim().is_empty() {
        return Err(bad_request(
            "Origin and destination airport codes are required",
            None,
        ));
    }

    let planned = plan_flight(state.as_ref(), &req.origin_icao, &req.dest_icao)
        .await
        .map_err(plan_error_response)?;

    // Destination METAR is degraded-but-non-fatal.
    let weather = match state.stations.metar(&req.dest_icao).await {
        Ok(report) => report,
        Err(err) => {
            tracing::warn!("destination METAR unavailable: {err}");
            WeatherReport::unavailable()
        }
    };

    let metrics = planned.metrics;
    Ok(Json(RouteResponse {
        path: planned.route.path.iter().map(|p| p.as_pair()).collect(),
        weather,
        storm_polygons: planned
            .route
            .hazards
            .polygons
            .iter()
            .map(|polygon| polygon.ring.iter().map(|p| p.as_pair()).collect())
            .collect(),
        flight_data: FlightData {
            distance_nm: metrics.distance_nm,
            ete: metrics.ete(),
        },
        coords: EndpointCoords {
            origin: planned.origin.as_pair(),
            dest: planned.destination.as_pair(),
        },
        route_status: planned.route.outcome,
    }))
}

async fn station_weather(
    State(state): State<Arc<AppState>>,
    Path(icao): Path<String>,
) -> Result<Json<WeatherReport>, ErrorResponse> {
    match state.stations.metar(&icao).await {
        Ok(report) => Ok(Json(report)),
        Err(FeedError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "Station not found",
                "icao": icao.trim().to_ascii_uppercase()
            })),
        )),
        Err(err) => Err((
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "error": "Weather lookup failed",
                "details": err.to_string()
            })),
        )),
    }
}

async fn train_model(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TrainRequest>,
) -> Result<Json<TrainResponse>, ErrorResponse> {
    if !req.lat.is_finite() || !(-90.0..=90.0).contains(&req.lat) {
        return Err(bad_request("Latitude out of range", Some("lat")));
    }
    if !req.lon.is_finite() || !(-180.0..=180.0).contains(&req.lon) {
        return Err(bad_request("Longitude out of range", Some("lon")));
    }

    let rows = state
        .history
        .fetch_training_rows(req.lat, req.lon)
        .await
        .map_err(|err| {
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": "Historical weather fetch failed",
                    "details": err.to_string()
                })),
            )
        })?;

    let (model, report) = VisibilityModel::fit(&rows, DEFAULT_TRAIN_SEED).map_err(|err| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "Training failed",
                "details": err.to_string()
            })),
        )
    })?;

    if let Err(err) = model.save(&state.model_path()) {
        tracing::error!("failed to persist visibility model: {err}");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Failed to persist model"})),
        ));
    }
    state.set_model(model);

    Ok(Json(TrainResponse {
        status: "trained".to_string(),
        accuracy_score: (report.r2 * 100.0).round() / 100.0,
        samples: report.samples,
    }))
}

async fn predict_visibility(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ErrorResponse> {
    if ![req.temperature, req.humidity, req.wind]
        .iter()
        .all(|value| value.is_finite())
    {
        return Err(bad_request("Inputs must be finite numbers", None));
    }

    let Some(model) = state.model() else {
        return Err((
            StatusCode::CONFLICT,
            Json(json!({
                "error": "No trained model available",
                "hint": "POST /api/train first"
            })),
        ));
    };

    Ok(Json(PredictResponse {
        predicted_visibility_m: model.predict(req.temperature, req.humidity, req.wind),
    }))
}

fn plan_error_response(err: PlanFlightError) -> ErrorResponse {
    match err {
        PlanFlightError::AirportNotFound(icao) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "Airport not found",
                "icao": icao
            })),
        ),
        PlanFlightError::Resolution(err) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "error": "Station lookup failed",
                "details": err.to_string()
            })),
        ),
        PlanFlightError::Geometry(err) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "Route computation failed",
                "details": err.to_string()
            })),
        ),
    }
}

fn bad_request(message: &str, field: Option<&str>) -> ErrorResponse {
    let mut payload = json!({ "error": message });
    if let Some(field) = field {
        payload["field"] = serde_json::Value::String(field.to_string());
    }
    (StatusCode::BAD_REQUEST, Json(payload))
}

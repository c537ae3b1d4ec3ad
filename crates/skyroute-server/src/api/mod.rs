//! API routes for the SkyRoute server.

mod routes;

use axum::Router;

pub use routes::{
    EndpointCoords, FlightData, PredictRequest, PredictResponse, RouteRequest, RouteResponse,
    TrainRequest, TrainResponse,
};

pub fn routes() -> Router<std::sync::Arc<crate::state::AppState>> {
    routes::create_router()
}

#[cfg(test)]
mod tests;

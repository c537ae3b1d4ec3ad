//! Server-side flight planning around the core engine.
//!
//! Wires the upstream feeds into the pure planner: stations resolve
//! fail-fatal, the hazard feed refreshes fail-open, and the outcome rides
//! back to the API layer as data.

use skyroute_core::{
    compute_metrics, plan_route, Coordinate, FlightMetrics, GeodesicError, HazardSet,
    PlannerConfig, RouteResult,
};
use skyroute_feeds::FeedError;
use thiserror::Error;

use crate::state::AppState;

#[derive(Debug, Error)]
pub enum PlanFlightError {
    #[error("airport not found: {0}")]
    AirportNotFound(String),
    #[error("station lookup failed: {0}")]
    Resolution(#[source] FeedError),
    #[error(transparent)]
    Geometry(#[from] GeodesicError),
}

pub struct PlannedFlight {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub route: RouteResult,
    pub metrics: FlightMetrics,
}

/// Refresh the hazard snapshot for one request.
///
/// Fail-open: a feed outage yields an empty snapshot and a warning; a route
/// is never blocked by infrastructure failure.
pub async fn refresh_hazards(state: &AppState) -> HazardSet {
    match state.sigmets.fetch_hazards().await {
        Ok(polygons) => {
            tracing::info!("loaded {} convective hazard cells", polygons.len());
            HazardSet::new(polygons)
        }
        Err(err) => {
            tracing::warn!("hazard feed unavailable, continuing with no hazards: {err}");
            HazardSet::empty()
        }
    }
}

/// Resolve both endpoints, refresh hazards, and plan the route.
pub async fn plan_flight(
    state: &AppState,
    origin_icao: &str,
    dest_icao: &str,
) -> Result<PlannedFlight, PlanFlightError> {
    let origin = resolve(state, origin_icao).await?;
    let destination = resolve(state, dest_icao).await?;

    let hazards = refresh_hazards(state).await;

    let config = PlannerConfig {
        mode: state.config.avoidance_mode,
        ..PlannerConfig::default()
    };
    let route = plan_route(origin, destination, &hazards, &config)?;
    tracing::debug!(
        "planned {origin_icao}->{dest_icao}: {:?} against {} hazard cells",
        route.outcome,
        route.hazards.len()
    );

    let metrics = compute_metrics(&route.path);
    Ok(PlannedFlight {
        origin,
        destination,
        route,
        metrics,
    })
}

async fn resolve(state: &AppState, icao: &str) -> Result<Coordinate, PlanFlightError> {
    state.resolve_station(icao).await.map_err(|err| match err {
        FeedError::NotFound(_) => {
            PlanFlightError::AirportNotFound(icao.trim().to_ascii_uppercase())
        }
        other => PlanFlightError::Resolution(other),
    })
}

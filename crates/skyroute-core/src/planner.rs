//! Route planning over a hazard snapshot.
//!
//! The planner walks INIT → HAZARDS_LOADED → PATH_GENERATED → VALIDATED and
//! terminates in SAFE, REROUTED, or FLAGGED_UNSAFE. Loading the snapshot is
//! the caller's job (the feed refresh is fail-open I/O); everything from the
//! loaded snapshot onward happens here.

use serde::{Deserialize, Serialize};

use crate::avoidance::{find_safe_path, AvoidanceConfig, AvoidanceError};
use crate::geo::GeodesicError;
use crate::models::{Coordinate, HazardSet, RouteOutcome, RouteResult};
use crate::path::{generate_path, DEFAULT_RESOLUTION};
use crate::safety::is_path_safe;

/// How the planner responds to a direct track that crosses a hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvoidanceMode {
    /// Return the direct track flagged unsafe (legacy demo behavior).
    FlagOnly,
    /// Search for a detour around the hazards.
    Reroute,
}

impl std::str::FromStr for AvoidanceMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "flag_only" | "flagonly" | "flag" => Ok(Self::FlagOnly),
            "reroute" => Ok(Self::Reroute),
            other => Err(format!("unknown avoidance mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Segments along the direct track (path has `resolution + 1` points).
    pub resolution: usize,
    pub mode: AvoidanceMode,
    pub avoidance: AvoidanceConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            mode: AvoidanceMode::Reroute,
            avoidance: AvoidanceConfig::default(),
        }
    }
}

/// Plan a route from `start` to `end` against the given hazard snapshot.
///
/// The snapshot travels into the result unchanged so the caller can surface
/// exactly what the path was validated against. An unsafe route is a valid
/// terminal outcome carried as data; only degenerate geometry is an error.
pub fn plan_route(
    start: Coordinate,
    end: Coordinate,
    hazards: &HazardSet,
    config: &PlannerConfig,
) -> Result<RouteResult, GeodesicError> {
    let direct = generate_path(start, end, config.resolution)?;

    if is_path_safe(&direct, hazards) {
        return Ok(RouteResult {
            path: direct,
            hazards: hazards.clone(),
            outcome: RouteOutcome::Safe,
        });
    }

    if config.mode == AvoidanceMode::FlagOnly {
        return Ok(RouteResult {
            path: direct,
            hazards: hazards.clone(),
            outcome: RouteOutcome::FlaggedUnsafe,
        });
    }

    let mut search = config.avoidance.clone();
    search.resolution = config.resolution;

    match find_safe_path(start, end, hazards, &search) {
        Ok(path) => Ok(RouteResult {
            path,
            hazards: hazards.clone(),
            outcome: RouteOutcome::Rerouted,
        }),
        Err(AvoidanceError::NoSafePath) => Ok(RouteResult {
            path: direct,
            hazards: hazards.clone(),
            outcome: RouteOutcome::FlaggedUnsafe,
        }),
        Err(AvoidanceError::Geodesic(err)) => Err(err),
    }
}

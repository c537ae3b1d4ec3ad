pub mod avoidance;
pub mod geo;
pub mod metrics;
pub mod models;
pub mod path;
pub mod planner;
pub mod safety;

pub use avoidance::{find_safe_path, AvoidanceConfig, AvoidanceError};
pub use geo::{
    distance_nm, haversine_distance_m, initial_bearing, intermediate_point, offset_by_bearing,
    GeodesicError, EARTH_RADIUS_M, METERS_PER_NM,
};
pub use metrics::{compute_metrics, FlightMetrics, CRUISE_SPEED_KT};
pub use models::{
    Coordinate, HazardPolygon, HazardSet, RouteOutcome, RouteResult, WeatherReport,
};
pub use path::{generate_path, DEFAULT_RESOLUTION};
pub use planner::{plan_route, AvoidanceMode, PlannerConfig};
pub use safety::{first_conflict, is_path_safe, PathConflict};

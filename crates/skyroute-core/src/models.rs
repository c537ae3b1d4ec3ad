//! Core data models for flight routing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeodesicError;

/// A position on the earth in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Validate and construct a coordinate.
    /// Latitude must be within [-90, 90], longitude within [-180, 180].
    pub fn new(lat: f64, lon: f64) -> Result<Self, GeodesicError> {
        if !lat.is_finite()
            || !lon.is_finite()
            || !(-90.0..=90.0).contains(&lat)
            || !(-180.0..=180.0).contains(&lon)
        {
            return Err(GeodesicError::InvalidCoordinate { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    /// Coordinate as a `[lat, lon]` pair for wire formats.
    pub fn as_pair(&self) -> [f64; 2] {
        [self.lat, self.lon]
    }
}

/// A polygonal region of hazardous weather (convective SIGMET cell).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardPolygon {
    /// Hazard qualifier from the feed (`TS`, `CB`).
    pub qualifier: String,
    /// Ring vertices as [lat, lon]; treated as closed whether or not the
    /// first vertex is repeated at the end.
    pub ring: Vec<Coordinate>,
}

impl HazardPolygon {
    pub fn new(qualifier: impl Into<String>, ring: Vec<Coordinate>) -> Self {
        Self {
            qualifier: qualifier.into(),
            ring,
        }
    }

    /// Check if a point is inside this polygon.
    /// Uses ray casting on the closed ring, treating (lat, lon) as planar.
    ///
    /// Edge handling is half-open: a point exactly on a minimum-latitude or
    /// minimum-longitude edge counts as inside, one on a maximum edge as
    /// outside. Rings with fewer than 3 vertices contain nothing.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        let n = self.ring.len();
        if n < 3 {
            return false;
        }

        // Ray casting: count intersections with polygon edges
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let yi = self.ring[i].lat;
            let xi = self.ring[i].lon;
            let yj = self.ring[j].lat;
            let xj = self.ring[j].lon;

            if ((yi > lat) != (yj > lat)) && (lon < (xj - xi) * (lat - yi) / (yj - yi) + xi) {
                inside = !inside;
            }
            j = i;
        }

        inside
    }

    pub fn contains_coordinate(&self, point: Coordinate) -> bool {
        self.contains(point.lat, point.lon)
    }
}

/// Snapshot of hazard polygons used for a single routing request.
///
/// Rebuilt wholesale per request; never merged with or shared across
/// earlier snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardSet {
    pub polygons: Vec<HazardPolygon>,
    pub fetched_at: DateTime<Utc>,
}

impl HazardSet {
    pub fn new(polygons: Vec<HazardPolygon>) -> Self {
        Self {
            polygons,
            fetched_at: Utc::now(),
        }
    }

    /// Snapshot with no known hazards (the fail-open case).
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }
}

/// Terminal state of a planning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteOutcome {
    /// The direct great-circle track clears every known hazard.
    Safe,
    /// The direct track was unsafe; the returned path detours around the hazards.
    Rerouted,
    /// The returned path crosses a hazard and no safe alternative was found.
    FlaggedUnsafe,
}

impl RouteOutcome {
    pub fn is_safe(self) -> bool {
        !matches!(self, RouteOutcome::FlaggedUnsafe)
    }
}

/// Output bundle of a planning run: the final path, the hazard snapshot it
/// was validated against, and the terminal state for the caller to surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResult {
    pub path: Vec<Coordinate>,
    pub hazards: HazardSet,
    pub outcome: RouteOutcome,
}

/// Human-readable station weather summary (flight rules, visibility, wind).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub condition: String,
    pub visibility: String,
    pub wind: String,
}

impl WeatherReport {
    /// Placeholder report when the METAR source is unreachable.
    pub fn unavailable() -> Self {
        Self {
            condition: "N/A".to_string(),
            visibility: "N/A".to_string(),
            wind: "N/A".to_string(),
        }
    }

    /// Canned report used when no upstream token is configured.
    pub fn simulated() -> Self {
        Self {
            condition: "SIMULATED".to_string(),
            visibility: "10 SM".to_string(),
            wind: "000@00KT".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(qualifier: &str) -> HazardPolygon {
        // lat 0..10, lon 0..10
        HazardPolygon::new(
            qualifier,
            vec![
                Coordinate { lat: 0.0, lon: 0.0 },
                Coordinate { lat: 10.0, lon: 0.0 },
                Coordinate {
                    lat: 10.0,
                    lon: 10.0,
                },
                Coordinate { lat: 0.0, lon: 10.0 },
            ],
        )
    }

    #[test]
    fn coordinate_validation() {
        assert!(Coordinate::new(40.6413, -73.7781).is_ok());
        assert!(Coordinate::new(91.0, 0.0).is_err());
        assert!(Coordinate::new(0.0, -181.0).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn polygon_contains_interior_point() {
        assert!(square("TS").contains(5.0, 5.0));
    }

    #[test]
    fn polygon_excludes_exterior_point() {
        assert!(!square("TS").contains(15.0, 5.0));
        assert!(!square("TS").contains(5.0, -1.0));
    }

    #[test]
    fn polygon_boundary_convention_is_half_open() {
        // Minimum-longitude edge counts as inside, maximum edge as outside.
        let poly = square("CB");
        assert!(poly.contains(5.0, 0.0));
        assert!(!poly.contains(5.0, 10.0));
        // Same half-open rule along latitude.
        assert!(poly.contains(0.0, 5.0));
        assert!(!poly.contains(10.0, 5.0));
    }

    #[test]
    fn polygon_with_repeated_closing_vertex() {
        let mut ring = square("TS").ring;
        let first = ring[0];
        ring.push(first);
        let poly = HazardPolygon::new("TS", ring);
        assert!(poly.contains(5.0, 5.0));
        assert!(!poly.contains(11.0, 5.0));
    }

    #[test]
    fn degenerate_ring_contains_nothing() {
        let poly = HazardPolygon::new(
            "TS",
            vec![
                Coordinate { lat: 0.0, lon: 0.0 },
                Coordinate { lat: 1.0, lon: 1.0 },
            ],
        );
        assert!(!poly.contains(0.5, 0.5));
    }

    #[test]
    fn route_outcome_serializes_snake_case() {
        let json = serde_json::to_string(&RouteOutcome::FlaggedUnsafe).unwrap();
        assert_eq!(json, "\"flagged_unsafe\"");
    }
}

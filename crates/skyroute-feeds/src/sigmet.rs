//! International SIGMET feed client (aviationweather.gov).

use reqwest::Client;
use serde::Deserialize;
use skyroute_core::{Coordinate, HazardPolygon};

use crate::error::FeedError;

pub const DEFAULT_SIGMET_BASE_URL: &str = "https://aviationweather.gov";

/// Qualifiers that mark a record as convective (thunderstorm-class).
const CONVECTIVE_QUALIFIERS: [&str; 2] = ["TS", "CB"];

#[derive(Debug, Clone, Deserialize)]
struct SigmetRecord {
    #[serde(default)]
    qualifier: Option<String>,
    #[serde(default)]
    coords: Option<Vec<SigmetPoint>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct SigmetPoint {
    lat: f64,
    lon: f64,
}

/// Client for the live international SIGMET feed.
pub struct SigmetClient {
    client: Client,
    base_url: String,
}

impl SigmetClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch the current convective hazard polygons.
    ///
    /// Non-convective records and degenerate geometry (fewer than 3 points)
    /// are dropped. Transport and parse failures surface as typed errors;
    /// the fail-open policy lives with the caller, not here.
    pub async fn fetch_hazards(&self) -> Result<Vec<HazardPolygon>, FeedError> {
        let url = format!("{}/api/data/isigmet?format=json", self.base_url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body = response.text().await?;
        parse_hazards(&body)
    }
}

fn parse_hazards(body: &str) -> Result<Vec<HazardPolygon>, FeedError> {
    let records: Vec<SigmetRecord> =
        serde_json::from_str(body).map_err(|err| FeedError::Malformed(err.to_string()))?;

    let mut polygons = Vec::new();
    for record in records {
        let Some(qualifier) = record.qualifier else {
            continue;
        };
        if !CONVECTIVE_QUALIFIERS.contains(&qualifier.as_str()) {
            continue;
        }
        let Some(points) = record.coords else {
            continue;
        };
        if points.len() < 3 {
            tracing::debug!(
                "dropping degenerate SIGMET record with {} points",
                points.len()
            );
            continue;
        }

        let ring: Result<Vec<Coordinate>, _> = points
            .iter()
            .map(|point| Coordinate::new(point.lat, point.lon))
            .collect();
        match ring {
            Ok(ring) => polygons.push(HazardPolygon::new(qualifier, ring)),
            Err(err) => {
                tracing::debug!("dropping SIGMET record with bad vertex: {err}");
            }
        }
    }
    Ok(polygons)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED_FIXTURE: &str = r#"[
        {"qualifier": "TS", "coords": [
            {"lat": 30.0, "lon": -40.0},
            {"lat": 32.0, "lon": -40.0},
            {"lat": 32.0, "lon": -38.0},
            {"lat": 30.0, "lon": -38.0}
        ]},
        {"qualifier": "CB", "coords": [
            {"lat": 10.0, "lon": 10.0},
            {"lat": 11.0, "lon": 10.0},
            {"lat": 11.0, "lon": 11.0}
        ]},
        {"qualifier": "TURB", "coords": [
            {"lat": 0.0, "lon": 0.0},
            {"lat": 1.0, "lon": 0.0},
            {"lat": 1.0, "lon": 1.0}
        ]},
        {"qualifier": "TS", "coords": [
            {"lat": 5.0, "lon": 5.0},
            {"lat": 6.0, "lon": 5.0}
        ]},
        {"qualifier": "TS"},
        {"coords": [{"lat": 1.0, "lon": 1.0}]}
    ]"#;

    #[test]
    fn parses_only_convective_polygons() {
        let polygons = parse_hazards(FEED_FIXTURE).unwrap();
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[0].qualifier, "TS");
        assert_eq!(polygons[0].ring.len(), 4);
        assert_eq!(polygons[1].qualifier, "CB");
        assert_eq!(polygons[1].ring.len(), 3);
    }

    #[test]
    fn out_of_range_vertices_drop_the_record() {
        let body = r#"[{"qualifier": "TS", "coords": [
            {"lat": 95.0, "lon": 0.0},
            {"lat": 1.0, "lon": 0.0},
            {"lat": 1.0, "lon": 1.0}
        ]}]"#;
        let polygons = parse_hazards(body).unwrap();
        assert!(polygons.is_empty());
    }

    #[test]
    fn malformed_body_is_a_typed_error() {
        let got = parse_hazards("{\"not\": \"an array\"}");
        assert!(matches!(got, Err(FeedError::Malformed(_))));
    }

    #[test]
    fn empty_feed_parses_to_no_hazards() {
        assert!(parse_hazards("[]").unwrap().is_empty());
    }
}

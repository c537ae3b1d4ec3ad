//! Airport station resolver and METAR reporter (AVWX).

use reqwest::Client;
use serde::Deserialize;
use skyroute_core::{Coordinate, WeatherReport};

use crate::error::FeedError;

pub const DEFAULT_AVWX_BASE_URL: &str = "https://avwx.rest";

/// Well-known airports answered locally when no AVWX token is configured.
/// Unknown codes still fail with `NotFound` — resolution is never silently
/// substituted.
const OFFLINE_STATIONS: [(&str, f64, f64); 5] = [
    ("KJFK", 40.6413, -73.7781),
    ("CYOW", 45.3192, -75.6903),
    ("EGLL", 51.47, -0.4543),
    ("KLAX", 33.9416, -118.4085),
    ("CYYZ", 43.6777, -79.6248),
];

#[derive(Debug, Deserialize)]
struct StationResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct MetarResponse {
    #[serde(default)]
    flight_rules: Option<String>,
    #[serde(default)]
    visibility: Option<MetarValue>,
    #[serde(default)]
    wind_direction: Option<MetarValue>,
    #[serde(default)]
    wind_speed: Option<MetarValue>,
}

#[derive(Debug, Deserialize)]
struct MetarValue {
    value: Option<f64>,
}

/// Client for AVWX station metadata and METAR lookups.
pub struct StationClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl StationClient {
    pub fn new(client: Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token: token
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
        }
    }

    pub fn is_offline(&self) -> bool {
        self.token.is_none()
    }

    /// Resolve an ICAO code to its coordinates.
    ///
    /// Unknown stations are a hard `NotFound` for the requesting flight.
    pub async fn resolve(&self, icao: &str) -> Result<Coordinate, FeedError> {
        let icao = normalize_icao(icao)?;

        let Some(token) = self.token.as_deref() else {
            return offline_lookup(&icao)
                .ok_or_else(|| FeedError::NotFound(format!("station {icao}")));
        };

        let url = format!("{}/api/station/{}", self.base_url, icao);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("BEARER {token}"))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FeedError::NotFound(format!("station {icao}")));
        }
        let body = response.error_for_status()?.text().await?;
        parse_station_response(&icao, &body)
    }

    /// Fetch the current METAR summary for a station.
    pub async fn metar(&self, icao: &str) -> Result<WeatherReport, FeedError> {
        let icao = normalize_icao(icao)?;

        let Some(token) = self.token.as_deref() else {
            return Ok(WeatherReport::simulated());
        };

        let url = format!("{}/api/metar/{}", self.base_url, icao);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("BEARER {token}"))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FeedError::NotFound(format!("metar {icao}")));
        }
        let body = response.error_for_status()?.text().await?;
        parse_metar_response(&body)
    }
}

fn normalize_icao(icao: &str) -> Result<String, FeedError> {
    let icao = icao.trim().to_ascii_uppercase();
    if icao.is_empty() {
        return Err(FeedError::NotFound("empty station code".to_string()));
    }
    Ok(icao)
}

fn offline_lookup(icao: &str) -> Option<Coordinate> {
    OFFLINE_STATIONS
        .iter()
        .find(|(code, _, _)| *code == icao)
        .map(|(_, lat, lon)| Coordinate { lat: *lat, lon: *lon })
}

fn parse_station_response(icao: &str, body: &str) -> Result<Coordinate, FeedError> {
    let parsed: StationResponse =
        serde_json::from_str(body).map_err(|err| FeedError::Malformed(err.to_string()))?;
    match (parsed.latitude, parsed.longitude) {
        (Some(lat), Some(lon)) => {
            Coordinate::new(lat, lon).map_err(|err| FeedError::Malformed(err.to_string()))
        }
        _ => Err(FeedError::Malformed(format!(
            "station {icao} response missing coordinates"
        ))),
    }
}

fn parse_metar_response(body: &str) -> Result<WeatherReport, FeedError> {
    let parsed: MetarResponse =
        serde_json::from_str(body).map_err(|err| FeedError::Malformed(err.to_string()))?;

    let visibility = parsed
        .visibility
        .and_then(|value| value.value)
        .map(format_number)
        .unwrap_or_else(|| "10".to_string());
    let direction = parsed
        .wind_direction
        .and_then(|value| value.value)
        .unwrap_or(0.0);
    let speed = parsed.wind_speed.and_then(|value| value.value).unwrap_or(0.0);

    Ok(WeatherReport {
        condition: parsed.flight_rules.unwrap_or_else(|| "VFR".to_string()),
        visibility: format!("{visibility} SM"),
        wind: format!("{:03}@{:02}KT", direction.round() as i64, speed.round() as i64),
    })
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client() -> StationClient {
        StationClient::new(Client::new(), DEFAULT_AVWX_BASE_URL, None)
    }

    #[tokio::test]
    async fn offline_resolve_knows_common_airports() {
        let coord = offline_client().resolve("kjfk").await.unwrap();
        assert!((coord.lat - 40.6413).abs() < 1e-9);
        assert!((coord.lon + 73.7781).abs() < 1e-9);
    }

    #[tokio::test]
    async fn offline_resolve_rejects_unknown_codes() {
        let got = offline_client().resolve("ZZZZ").await;
        assert!(matches!(got, Err(FeedError::NotFound(_))));
    }

    #[tokio::test]
    async fn offline_metar_is_simulated() {
        let report = offline_client().metar("EGLL").await.unwrap();
        assert_eq!(report, WeatherReport::simulated());
    }

    #[test]
    fn empty_icao_is_not_found() {
        assert!(matches!(normalize_icao("  "), Err(FeedError::NotFound(_))));
    }

    #[test]
    fn parses_full_metar_response() {
        let body = r#"{
            "flight_rules": "IFR",
            "visibility": {"value": 2.5},
            "wind_direction": {"value": 270},
            "wind_speed": {"value": 8}
        }"#;
        let report = parse_metar_response(body).unwrap();
        assert_eq!(report.condition, "IFR");
        assert_eq!(report.visibility, "2.5 SM");
        assert_eq!(report.wind, "270@08KT");
    }

    #[test]
    fn metar_defaults_fill_missing_fields() {
        let report = parse_metar_response("{}").unwrap();
        assert_eq!(report.condition, "VFR");
        assert_eq!(report.visibility, "10 SM");
        assert_eq!(report.wind, "000@00KT");
    }

    #[test]
    fn station_without_coordinates_is_malformed() {
        let got = parse_station_response("KJFK", r#"{"latitude": null}"#);
        assert!(matches!(got, Err(FeedError::Malformed(_))));
    }

    #[test]
    fn station_response_parses_coordinates() {
        let coord =
            parse_station_response("KJFK", r#"{"latitude": 40.6413, "longitude": -73.7781}"#)
                .unwrap();
        assert!((coord.lat - 40.6413).abs() < 1e-9);
    }
}

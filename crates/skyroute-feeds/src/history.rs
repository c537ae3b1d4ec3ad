//! Historical weather archive client (Open-Meteo) for model training.

use std::time::{Duration, Instant};

use chrono::{Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use reqwest::Client;
use serde::Deserialize;
use skyroute_model::TrainingRow;

use crate::backoff::Backoff;
use crate::error::FeedError;

pub const DEFAULT_OPENMETEO_BASE_URL: &str = "https://archive-api.open-meteo.com";

const HISTORY_DAYS: i64 = 90;
const HOURLY_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,visibility";

/// Retry and cache policy for the archive client. Explicit per instance —
/// there is no process-wide session.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    pub base_url: String,
    /// Retries after the first attempt.
    pub retries: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    pub cache_ttl: Duration,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPENMETEO_BASE_URL.to_string(),
            retries: 4,
            backoff_base: Duration::from_millis(200),
            backoff_max: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(3_600),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedRows {
    fetched_at: Instant,
    rows: Vec<TrainingRow>,
}

/// Client for the Open-Meteo historical archive.
pub struct HistoryClient {
    client: Client,
    config: HistoryConfig,
    cache: DashMap<String, CachedRows>,
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    hourly: Option<HourlyBlock>,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    visibility: Vec<Option<f64>>,
}

impl HistoryClient {
    pub fn new(client: Client, config: HistoryConfig) -> Self {
        Self {
            client,
            config,
            cache: DashMap::new(),
        }
    }

    /// Fetch the last 90 days of hourly observations for a coordinate,
    /// ready for fitting. Served from cache within the configured TTL.
    pub async fn fetch_training_rows(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Vec<TrainingRow>, FeedError> {
        let end = Utc::now().date_naive() - ChronoDuration::days(1);
        let start = end - ChronoDuration::days(HISTORY_DAYS);

        let cache_key = format!("{lat:.4},{lon:.4},{start},{end}");
        if let Some(entry) = self.cache.get(&cache_key) {
            if entry.fetched_at.elapsed() <= self.config.cache_ttl {
                return Ok(entry.rows.clone());
            }
        }

        let url = format!(
            "{}/v1/archive?latitude={lat}&longitude={lon}&start_date={start}&end_date={end}&hourly={HOURLY_FIELDS}",
            self.config.base_url
        );

        let mut backoff = Backoff::new(self.config.backoff_base, self.config.backoff_max);
        let mut attempt = 0u32;
        let body = loop {
            match self.fetch_once(&url).await {
                Ok(body) => break body,
                Err(err) if attempt < self.config.retries => {
                    attempt += 1;
                    let delay = backoff.next_delay();
                    tracing::warn!(
                        "history fetch attempt {attempt} failed, retrying in {delay:?}: {err}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        };

        let rows = parse_training_rows(&body)?;
        tracing::info!("fetched {} training rows for {lat:.4},{lon:.4}", rows.len());
        self.cache.insert(
            cache_key,
            CachedRows {
                fetched_at: Instant::now(),
                rows: rows.clone(),
            },
        );
        Ok(rows)
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FeedError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

fn parse_training_rows(body: &str) -> Result<Vec<TrainingRow>, FeedError> {
    let parsed: ArchiveResponse =
        serde_json::from_str(body).map_err(|err| FeedError::Malformed(err.to_string()))?;
    let Some(hourly) = parsed.hourly else {
        return Err(FeedError::Malformed(
            "archive response missing hourly block".to_string(),
        ));
    };

    let len = hourly
        .temperature_2m
        .len()
        .min(hourly.relative_humidity_2m.len())
        .min(hourly.wind_speed_10m.len())
        .min(hourly.visibility.len());

    let mut rows = Vec::with_capacity(len);
    for i in 0..len {
        let (Some(temperature), Some(humidity), Some(wind), Some(visibility)) = (
            hourly.temperature_2m[i],
            hourly.relative_humidity_2m[i],
            hourly.wind_speed_10m[i],
            hourly.visibility[i],
        ) else {
            continue;
        };
        if ![temperature, humidity, wind, visibility]
            .iter()
            .all(|value| value.is_finite())
        {
            continue;
        }
        rows.push(TrainingRow {
            temperature,
            humidity,
            wind,
            visibility,
        });
    }
    Ok(rows)
}

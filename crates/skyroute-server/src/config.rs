//! Server configuration from environment.

use std::env;
use std::time::Duration;

use skyroute_core::AvoidanceMode;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub avwx_url: String,
    /// AVWX API token; absent means offline mode (built-in station table,
    /// simulated METARs).
    pub avwx_token: Option<String>,
    pub sigmet_url: String,
    pub openmeteo_url: String,
    /// Timeout applied to every outbound feed request.
    pub http_timeout: Duration,
    pub avoidance_mode: AvoidanceMode,
    pub model_path: String,
    pub station_cache_ttl: Duration,
    pub history_cache_ttl: Duration,
    pub history_retries: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("SKYROUTE_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            avwx_url: env::var("SKYROUTE_AVWX_URL")
                .unwrap_or_else(|_| skyroute_feeds::DEFAULT_AVWX_BASE_URL.to_string()),
            avwx_token: env::var("AVWX_API_TOKEN")
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            sigmet_url: env::var("SKYROUTE_SIGMET_URL")
                .unwrap_or_else(|_| skyroute_feeds::DEFAULT_SIGMET_BASE_URL.to_string()),
            openmeteo_url: env::var("SKYROUTE_OPENMETEO_URL")
                .unwrap_or_else(|_| skyroute_feeds::DEFAULT_OPENMETEO_BASE_URL.to_string()),
            http_timeout: Duration::from_secs(env_u64("SKYROUTE_HTTP_TIMEOUT_S", 10)),
            avoidance_mode: env::var("SKYROUTE_AVOIDANCE_MODE")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(AvoidanceMode::Reroute),
            model_path: env::var("SKYROUTE_MODEL_PATH")
                .unwrap_or_else(|_| "visibility_model.json".to_string()),
            station_cache_ttl: Duration::from_secs(env_u64("SKYROUTE_STATION_CACHE_TTL_S", 600)),
            history_cache_ttl: Duration::from_secs(env_u64("SKYROUTE_HISTORY_CACHE_TTL_S", 3_600)),
            history_retries: env_u64("SKYROUTE_FEED_RETRIES", 4) as u32,
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

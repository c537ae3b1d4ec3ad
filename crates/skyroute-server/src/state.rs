//! Shared application state: feed clients, caches, and the loaded model.

use std::path::PathBuf;
use std::sync::RwLock;
use std::time::Instant;

use dashmap::DashMap;
use reqwest::Client;
use skyroute_core::Coordinate;
use skyroute_feeds::{FeedError, HistoryClient, HistoryConfig, SigmetClient, StationClient};
use skyroute_model::{ModelError, VisibilityModel};

use crate::config::Config;

#[derive(Debug, Clone, Copy)]
struct StationCacheEntry {
    fetched_at: Instant,
    coordinate: Coordinate,
}

pub struct AppState {
    pub config: Config,
    pub stations: StationClient,
    pub sigmets: SigmetClient,
    pub history: HistoryClient,
    station_cache: DashMap<String, StationCacheEntry>,
    model: RwLock<Option<VisibilityModel>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .expect("Failed to create HTTP client");

        let stations = StationClient::new(
            client.clone(),
            config.avwx_url.clone(),
            config.avwx_token.clone(),
        );
        let sigmets = SigmetClient::new(client.clone(), config.sigmet_url.clone());
        let history = HistoryClient::new(
            client,
            HistoryConfig {
                base_url: config.openmeteo_url.clone(),
                retries: config.history_retries,
                cache_ttl: config.history_cache_ttl,
                ..HistoryConfig::default()
            },
        );

        Self {
            config,
            stations,
            sigmets,
            history,
            station_cache: DashMap::new(),
            model: RwLock::new(None),
        }
    }

    /// Resolve a station with a TTL cache in front of the upstream client.
    pub async fn resolve_station(&self, icao: &str) -> Result<Coordinate, FeedError> {
        let key = icao.trim().to_ascii_uppercase();
        if let Some(entry) = self.station_cache.get(&key) {
            if entry.fetched_at.elapsed() <= self.config.station_cache_ttl {
                return Ok(entry.coordinate);
            }
        }

        let coordinate = self.stations.resolve(&key).await?;
        self.station_cache.insert(
            key,
            StationCacheEntry {
                fetched_at: Instant::now(),
                coordinate,
            },
        );
        Ok(coordinate)
    }

    pub fn model_path(&self) -> PathBuf {
        PathBuf::from(&self.config.model_path)
    }

    /// Load a previously trained model, if one was saved.
    pub fn load_model_from_disk(&self) {
        match VisibilityModel::load(&self.model_path()) {
            Ok(model) => {
                tracing::info!("visibility model loaded ({} samples)", model.samples);
                self.set_model(model);
            }
            Err(ModelError::NotTrained) => {
                tracing::warn!("no saved visibility model; train before predicting");
            }
            Err(err) => {
                tracing::warn!("failed to load visibility model: {err}");
            }
        }
    }

    pub fn set_model(&self, model: VisibilityModel) {
        if let Ok(mut slot) = self.model.write() {
            *slot = Some(model);
        }
    }

    pub fn model(&self) -> Option<VisibilityModel> {
        self.model.read().ok().and_then(|slot| slot.clone())
    }
}

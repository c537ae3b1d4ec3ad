//! HTTP clients for the upstream station, hazard, and archive feeds.

pub mod backoff;
pub mod error;
pub mod history;
pub mod sigmet;
pub mod station;

pub use backoff::Backoff;
pub use error::FeedError;
pub use history::{HistoryClient, HistoryConfig, DEFAULT_OPENMETEO_BASE_URL};
pub use sigmet::{SigmetClient, DEFAULT_SIGMET_BASE_URL};
pub use station::{StationClient, DEFAULT_AVWX_BASE_URL};

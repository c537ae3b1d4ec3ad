//! Typed errors for the upstream feed clients.

use thiserror::Error;

/// Failure modes of an upstream feed call, kept distinct so callers can
/// apply fail-open or fail-fatal policy deliberately rather than by
/// accident of a catch-all.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The requested entity does not exist upstream (unknown station, etc.).
    #[error("not found: {0}")]
    NotFound(String),
    /// The request itself failed (connect, timeout, non-2xx status).
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    /// The upstream answered but the payload did not match the contract.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FeedError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FeedError::NotFound(_))
    }
}

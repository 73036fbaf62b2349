//! Rift-Crawler: a ranked match discovery and ingestion crawler
//!
//! This crate walks outward from seed matches through participants' match
//! histories, keeps only ranked 5v5 matches on whitelisted patches played
//! by tracked-tier participants, and stores match and timeline statistics.

pub mod config;
pub mod crawler;
pub mod notify;
pub mod output;
pub mod riot;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Remote API error: {0}")]
    Gateway(#[from] riot::GatewayError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Crawl state lock poisoned: {0}")]
    StatePoisoned(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Environment variable {0} is not set")]
    MissingEnv(String),
}

/// Outcome of processing a single match that did not end in ingestion
///
/// The scheduler only ever sees `RateLimited` and `Unknown`; the per-match
/// boundary absorbs `NotFound` and `ValidationRejected`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("remote data not found")]
    NotFound,

    #[error("rate limited by remote API")]
    RateLimited,

    #[error("rejected: {0}")]
    ValidationRejected(crawler::RejectReason),

    #[error("unexpected failure: {0}")]
    Unknown(String),
}

impl From<riot::GatewayError> for MatchError {
    fn from(err: riot::GatewayError) -> Self {
        match err {
            riot::GatewayError::NotFound => Self::NotFound,
            riot::GatewayError::RateLimited => Self::RateLimited,
            riot::GatewayError::Unknown(cause) => Self::Unknown(cause),
        }
    }
}

impl From<storage::StorageError> for MatchError {
    fn from(err: storage::StorageError) -> Self {
        Self::Unknown(err.to_string())
    }
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlHandle, CrawlSummary, Crawler};
pub use state::{Frontier, PatchVersion, RankTier, TierBand};

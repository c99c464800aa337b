//! App-Reviews: a concurrent pager for the App Store review feed
//!
//! This crate fetches every page of a paginated JSON review feed that does not
//! advertise its page count. Pages are requested concurrently until the feed
//! answers with a non-success status or an undecodable body, and all decoded
//! pages are returned together.

pub mod config;
pub mod feed;
pub mod fetcher;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for App-Reviews operations
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
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

    #[error("Invalid feed URL template: {0}")]
    InvalidFeedUrl(String),
}

/// Outcome of a single page request that did not produce a page
///
/// Only [`FetchError::Transport`] leaves the fetch running; every other
/// variant raises the shared cancellation signal.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Cannot build request for page {page}: {message}")]
    RequestConstruction { page: u64, message: String },

    #[error("Transport error for page {page}: {source}")]
    Transport { page: u64, source: reqwest::Error },

    #[error("Feed exhausted at page {page} (HTTP {status})")]
    ExhaustionStatus { page: u64, status: u16 },

    #[error("Cannot decode page {page}: {message}")]
    Decode { page: u64, message: String },
}

impl FetchError {
    /// Page number the failed request was built for
    pub fn page(&self) -> u64 {
        match self {
            Self::RequestConstruction { page, .. }
            | Self::Transport { page, .. }
            | Self::ExhaustionStatus { page, .. }
            | Self::Decode { page, .. } => *page,
        }
    }

    /// Returns true if this outcome must stop the whole fetch
    pub fn is_exhaustion(&self) -> bool {
        !matches!(self, Self::Transport { .. })
    }
}

/// Result type alias for App-Reviews operations
pub type Result<T> = std::result::Result<T, ReviewError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use feed::{Entry, ReviewFeed};
pub use fetcher::{fetch_app_reviews, FetchReport, ReviewFetcher};
pub use state::WorkerState;

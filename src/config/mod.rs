//! Configuration module for App-Reviews
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional; a missing file section keeps its defaults.
//!
//! # Example
//!
//! ```no_run
//! use app_reviews::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("reviews.toml")).unwrap();
//! println!("Fetching with {} slots", config.fetcher.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FetcherConfig, OutputConfig, OutputFormat, TransportConfig, UserAgentConfig,
    DEFAULT_FEED_URL,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;

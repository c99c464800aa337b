use serde::Deserialize;
use std::time::Duration;

/// Default App Store review feed, `{id}` and `{page}` are substituted per request
pub const DEFAULT_FEED_URL: &str =
    "https://itunes.apple.com/rss/customerreviews/id={id}/page={page}/sortby=mostrecent/json";

/// Main configuration structure for App-Reviews
///
/// Every section is optional in the TOML file; missing keys fall back to
/// the defaults of the section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Paginated fetch behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Feed URL template containing `{id}` and `{page}` placeholders
    #[serde(rename = "feed-url")]
    pub feed_url: String,

    /// Maximum number of page requests on the wire at once
    pub concurrency: u32,

    /// Upper bound (exclusive) of the random delay before taking a slot (milliseconds)
    #[serde(rename = "max-jitter-ms")]
    pub max_jitter_ms: u64,

    /// Maximum number of spawned workers that have not finished yet
    ///
    /// Defaults to twice the concurrency when unset. Must not be below
    /// `concurrency`, or fewer requests than configured could run at once.
    #[serde(rename = "max-pending-workers")]
    pub max_pending_workers: Option<u32>,

    /// Wait for already spawned workers once the feed is exhausted
    #[serde(rename = "settle-in-flight")]
    pub settle_in_flight: bool,
}

impl FetcherConfig {
    pub fn max_jitter(&self) -> Duration {
        Duration::from_millis(self.max_jitter_ms)
    }

    /// Number of workers the dispatcher may keep outstanding
    pub fn pending_capacity(&self) -> usize {
        self.max_pending_workers
            .unwrap_or_else(|| self.concurrency.saturating_mul(2))
            .max(1) as usize
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            concurrency: 10,
            max_jitter_ms: 600,
            max_pending_workers: None,
            settle_in_flight: false,
        }
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// TCP keep-alive interval (seconds)
    #[serde(rename = "keep-alive-secs")]
    pub keep_alive_secs: u64,

    /// Overall timeout of a single page request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl TransportConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            keep_alive_secs: 60,
            request_timeout_secs: 10,
        }
    }
}

/// User agents rotated across page requests
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Explicit user agent strings; the built-in browser list is used when empty
    pub agents: Vec<String>,
}

/// Report format written to stdout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab-separated review rows
    #[default]
    Tsv,
    /// Word frequency counts
    Words,
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,

    /// Drop reviews rated strictly above this value (0 keeps everything)
    #[serde(rename = "filter-review")]
    pub filter_review: u8,
}

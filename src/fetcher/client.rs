//! HTTP client construction

use crate::config::TransportConfig;
use reqwest::Client;

/// Builds the pooled HTTP client used for every page request
///
/// Proxy settings are taken from the environment (`HTTPS_PROXY`, `HTTP_PROXY`,
/// `NO_PROXY`), which is reqwest's default behavior. The user agent is not
/// set here; each request carries one from the rotating pool.
///
/// # Arguments
///
/// * `config` - Timeouts and keep-alive settings
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use app_reviews::config::TransportConfig;
/// use app_reviews::fetcher::build_http_client;
///
/// let client = build_http_client(&TransportConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &TransportConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.request_timeout())
        .connect_timeout(config.connect_timeout())
        .tcp_keepalive(config.keep_alive())
        .gzip(true)
        .brotli(true)
        .build()
}

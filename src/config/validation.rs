use crate::config::types::{Config, FetcherConfig, OutputConfig, TransportConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_transport_config(&config.transport)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.max_jitter_ms > 10_000 {
        return Err(ConfigError::Validation(format!(
            "max_jitter_ms must be <= 10000ms, got {}ms",
            config.max_jitter_ms
        )));
    }

    if let Some(pending) = config.max_pending_workers {
        if pending < config.concurrency {
            return Err(ConfigError::Validation(format!(
                "max_pending_workers ({}) must be >= concurrency ({})",
                pending, config.concurrency
            )));
        }
    }

    validate_feed_url(&config.feed_url)
}

/// Validates a feed URL template
///
/// The template must carry both placeholders and still parse as an http(s)
/// URL once they are filled in.
fn validate_feed_url(template: &str) -> Result<(), ConfigError> {
    for placeholder in ["{id}", "{page}"] {
        if !template.contains(placeholder) {
            return Err(ConfigError::InvalidFeedUrl(format!(
                "'{}' is missing the {} placeholder",
                template, placeholder
            )));
        }
    }

    let sample = template.replace("{id}", "1").replace("{page}", "1");
    let url = Url::parse(&sample)
        .map_err(|e| ConfigError::InvalidFeedUrl(format!("'{}': {}", template, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidFeedUrl(format!(
            "'{}' must use http or https",
            template
        )));
    }

    Ok(())
}

/// Validates transport configuration
fn validate_transport_config(config: &TransportConfig) -> Result<(), ConfigError> {
    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    for agent in &config.agents {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user agent strings cannot be empty".to_string(),
            ));
        }

        if agent.chars().any(|c| c.is_control()) {
            return Err(ConfigError::Validation(format!(
                "user agent '{}' contains control characters",
                agent.escape_debug()
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.filter_review > 4 {
        return Err(ConfigError::Validation(format!(
            "filter_review must be between 0 and 4, got {}",
            config.filter_review
        )));
    }

    Ok(())
}

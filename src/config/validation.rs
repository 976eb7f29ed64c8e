use crate::config::types::{CrawlConfig, CrawlSettings, HeadlessConfig, RequestConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// The seed URL is only checked for presence here; parsing it is part of
/// crawl setup and reported as an invalid seed.
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_crawl_settings(&config.crawl)?;
    validate_request_config(&config.request)?;
    validate_headless_config(&config.headless)?;
    Ok(())
}

fn validate_crawl_settings(config: &CrawlSettings) -> Result<(), ConfigError> {
    if config.seed_url.trim().is_empty() {
        return Err(ConfigError::Validation(
            "seed-url is required (use --url or [crawl] seed-url)".to_string(),
        ));
    }

    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    Ok(())
}

fn validate_request_config(config: &RequestConfig) -> Result<(), ConfigError> {
    if config.user_agents.is_empty() {
        return Err(ConfigError::Validation(
            "at least one user agent is required".to_string(),
        ));
    }

    if config.user_agents.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user agents cannot be empty".to_string(),
        ));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min-delay-ms ({}) must not exceed max-delay-ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if let Some(proxy) = &config.proxy {
        let parsed = Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;

        // The HTTP client is built without SOCKS support.
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "Unsupported proxy scheme '{}' in '{}' (expected http or https)",
                parsed.scheme(),
                proxy
            )));
        }
    }

    Ok(())
}

fn validate_headless_config(config: &HeadlessConfig) -> Result<(), ConfigError> {
    if config.enabled && config.navigation_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "navigation-timeout-secs must be >= 1 when headless fallback is enabled".to_string(),
        ));
    }

    Ok(())
}

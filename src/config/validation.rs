use crate::config::types::{ApiConfig, Config, CrawlerConfig, OutputConfig};
use crate::ConfigError;
use std::path::Path;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the remote API configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    validate_http_url("endpoint", &config.endpoint)?;
    validate_http_url("article-base-url", &config.article_base_url)?;

    if config.page_size < 1 || config.page_size > 500 {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and 500, got {}",
            config.page_size
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request-timeout must be >= 1s".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the crawl loop configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.first_key < 1 {
        return Err(ConfigError::Validation(
            "first-key must be >= 1".to_string(),
        ));
    }

    if config.first_key >= config.max_key {
        return Err(ConfigError::Validation(format!(
            "first-key ({}) must be below max-key ({})",
            config.first_key, config.max_key
        )));
    }

    if config.error_delay < 1 {
        return Err(ConfigError::Validation(
            "error-delay must be >= 1ms".to_string(),
        ));
    }

    if config.max_error_delay() < config.error_delay {
        return Err(ConfigError::Validation(format!(
            "max-error-delay ({}ms) must not be below error-delay ({}ms)",
            config.max_error_delay(),
            config.error_delay
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    validate_path("state-path", &config.state_path)?;
    validate_path("corpus-path", &config.corpus_path)?;
    validate_path("stats-path", &config.stats_path)?;
    validate_path("report-path", &config.report_path)?;

    if let Some(log_path) = &config.log_path {
        validate_path("log-path", log_path)?;
    }

    Ok(())
}

fn validate_path(name: &str, path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
    }
    Ok(())
}

/// Checks that a configured URL parses and uses http or https
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}

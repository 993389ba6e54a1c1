use crate::config::types::{ClassifyRules, CrawlConfig};
use crate::scope;
use crate::ConfigError;

/// Validates the entire configuration
///
/// Every check here is pre-flight: a configuration that passes produces a job
/// that can start fetching without further setup failures.
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_base_url(&config.base_url)?;
    validate_limits(config)?;
    validate_rules(&config.rules)?;
    Ok(())
}

/// Validates the base URL: must parse with an http/https scheme and a host
fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    scope::validate_base_url(base_url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
    Ok(())
}

/// Validates the numeric crawl limits
fn validate_limits(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.parallelism < 1 || config.parallelism > 100 {
        return Err(ConfigError::Validation(format!(
            "parallelism must be between 1 and 100, got {}",
            config.parallelism
        )));
    }

    if config.request_interval_ms > 600_000 {
        return Err(ConfigError::Validation(format!(
            "request_interval_ms must be <= 600000, got {}",
            config.request_interval_ms
        )));
    }

    if config.jitter_ms > 600_000 {
        return Err(ConfigError::Validation(format!(
            "jitter_ms must be <= 600000, got {}",
            config.jitter_ms
        )));
    }

    if let Some(deadline) = config.deadline_ms {
        if deadline == 0 {
            return Err(ConfigError::Validation(
                "deadline_ms must be > 0 when set".to_string(),
            ));
        }
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the classification rules
///
/// Pattern lists may be empty (disabling that signal), but entries must be
/// non-empty lowercase tokens so segment matching stays predictable.
fn validate_rules(rules: &ClassifyRules) -> Result<(), ConfigError> {
    for pattern in rules.listing_patterns.iter().chain(&rules.article_patterns) {
        if pattern.is_empty() {
            return Err(ConfigError::Validation(
                "URL patterns cannot be empty".to_string(),
            ));
        }
        if pattern.chars().any(|c| c == '/' || c.is_whitespace()) {
            return Err(ConfigError::Validation(format!(
                "URL pattern '{}' must be a single path segment",
                pattern
            )));
        }
        if pattern.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::Validation(format!(
                "URL pattern '{}' must be lowercase",
                pattern
            )));
        }
    }

    for key in &rules.article_meta_keys {
        if key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "metadata keys cannot be empty".to_string(),
            ));
        }
    }

    for selector in &rules.evidence_selectors {
        if selector.trim().is_empty() {
            return Err(ConfigError::Validation(
                "evidence selectors cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

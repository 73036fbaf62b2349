use crate::config::types::{ApiConfig, Config, CrawlerConfig, FilterConfig, OutputConfig};
use crate::state::PatchVersion;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_filter_config(&config.filter)?;
    validate_api_config(&config.api)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 || config.batch_size > 100 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be between 1 and 100, got {}",
            config.batch_size
        )));
    }

    if config.seed_match_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "seed_match_id cannot be empty".to_string(),
        ));
    }

    if config.warm_start_sample < 1 {
        return Err(ConfigError::Validation(format!(
            "warm_start_sample must be >= 1, got {}",
            config.warm_start_sample
        )));
    }

    Ok(())
}

/// Validates the tier band and patch whitelist
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    let band = config.band();

    if band.is_empty() {
        return Err(ConfigError::Validation(
            "tier_band must contain at least one tier".to_string(),
        ));
    }

    if !band.is_contiguous() {
        return Err(ConfigError::Validation(format!(
            "tier_band must be contiguous on the ladder, got {:?}",
            band.tiers()
        )));
    }

    if config.patch_whitelist.is_empty() {
        return Err(ConfigError::Validation(
            "patch_whitelist must contain at least one patch".to_string(),
        ));
    }

    for patch in &config.patch_whitelist {
        patch
            .parse::<PatchVersion>()
            .map_err(|e| ConfigError::Validation(format!("Invalid patch: {}", e)))?;
    }

    Ok(())
}

/// Validates API configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    validate_base_url("regional_url", &config.regional_url)?;
    validate_base_url("platform_url", &config.platform_url)?;

    if config.api_key_env.is_empty() {
        return Err(ConfigError::Validation(
            "api_key_env cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that a base URL parses and uses an HTTP scheme
fn validate_base_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url =
        Url::parse(value).map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", name, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            name, value
        )));
    }

    Ok(())
}

use crate::config::types::{Config, DownloadConfig, HttpConfig, SourcesConfig, SpeciesEntry};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_download_config(&config.download)?;
    validate_sources_config(&config.sources)?;
    validate_species(&config.species)?;
    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 || config.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and 300, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates download configuration
fn validate_download_config(config: &DownloadConfig) -> Result<(), ConfigError> {
    if config.output_root.is_empty() {
        return Err(ConfigError::Validation(
            "output_root cannot be empty".to_string(),
        ));
    }

    if config.max_images_per_source < 1 {
        return Err(ConfigError::Validation(format!(
            "max_images_per_source must be >= 1, got {}",
            config.max_images_per_source
        )));
    }

    Ok(())
}

/// Validates source selection and endpoint URLs
fn validate_sources_config(config: &SourcesConfig) -> Result<(), ConfigError> {
    if !config.inaturalist && !config.gbif {
        return Err(ConfigError::Validation(
            "at least one source must be enabled".to_string(),
        ));
    }

    validate_endpoint("inaturalist_url", &config.inaturalist_url)?;
    validate_endpoint("gbif_url", &config.gbif_url)?;

    Ok(())
}

/// Validates an API base URL
fn validate_endpoint(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", key, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            key, value
        )));
    }

    Ok(())
}

/// Validates the species list
fn validate_species(species: &[SpeciesEntry]) -> Result<(), ConfigError> {
    if species.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[species]] entry is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in species {
        let name = entry.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "species name cannot be empty".to_string(),
            ));
        }

        if name == "." || name == ".." {
            return Err(ConfigError::Validation(format!(
                "species name '{}' is not a usable directory name",
                name
            )));
        }

        if name.contains('/') || name.contains('\\') {
            return Err(ConfigError::Validation(format!(
                "species name '{}' cannot contain path separators",
                name
            )));
        }

        if !seen.insert(name) {
            return Err(ConfigError::Validation(format!(
                "species '{}' is listed more than once",
                name
            )));
        }
    }

    Ok(())
}

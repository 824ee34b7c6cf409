use super::{types::Config, ConfigError};
use crate::catalog::MAX_FALLBACK_ATTEMPTS_LIMIT;
use crate::compositor::{INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER};
use crate::publisher::PublisherBackend;

/// Validate configuration
///
/// Checks what serde cannot: value ranges, credentials required by the
/// selected backends and the compositor placeholders.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    config
        .region
        .validate()
        .map_err(|e| ConfigError::ValidationError(format!("region: {e}")))?;

    if config.window.length_hours == 0 {
        return Err(invalid("window.length_hours must be greater than 0"));
    }
    if config.window.max_fallback_attempts > MAX_FALLBACK_ATTEMPTS_LIMIT {
        return Err(ConfigError::ValidationError(format!(
            "window.max_fallback_attempts must be at most {MAX_FALLBACK_ATTEMPTS_LIMIT}"
        )));
    }

    if config.catalog.collection.trim().is_empty() {
        return Err(invalid("catalog.collection cannot be empty"));
    }
    if config.catalog.consumer_key.is_empty() || config.catalog.consumer_secret.is_empty() {
        return Err(invalid(
            "catalog.consumer_key and catalog.consumer_secret are required",
        ));
    }
    if config.catalog.page_size == 0 {
        return Err(invalid("catalog.page_size must be greater than 0"));
    }

    if config.acquisition.sample_step == 0 {
        return Err(invalid("acquisition.sample_step must be at least 1"));
    }
    if config.acquisition.raw_extension.trim_start_matches('.').is_empty() {
        return Err(invalid("acquisition.raw_extension cannot be empty"));
    }

    for placeholder in [INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER] {
        if !config.compositor.args.iter().any(|a| a.contains(placeholder)) {
            return Err(ConfigError::ValidationError(format!(
                "compositor.args must contain {placeholder}"
            )));
        }
    }

    if config.animation.frame_delay_ms == 0 {
        return Err(invalid("animation.frame_delay_ms must be greater than 0"));
    }
    if config.animation.output_name.is_empty()
        || config.animation.output_name.contains(['/', '\\'])
    {
        return Err(invalid("animation.output_name must be a plain file name"));
    }

    if config.publisher.backend == PublisherBackend::X {
        match &config.publisher.x {
            Some(x) if !x.access_token.is_empty() => {}
            Some(_) => return Err(invalid("publisher.x.access_token is required")),
            None => {
                return Err(invalid(
                    "publisher.x section is required for the x backend",
                ))
            }
        }
    }

    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}

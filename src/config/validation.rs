use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("No valid credentials found for zenduty provider. Set provider.token or ZENDUTY_API_KEY")]
    MissingToken,

    #[error("Invalid base_url '{url}', expected an http:// or https:// URL")]
    InvalidBaseUrl { url: String },

    #[error("Duration must be positive: {field}")]
    ZeroDuration { field: String },

    #[error("retry.max_interval ({max}) is shorter than retry.initial_interval ({initial})")]
    RetryIntervalsInverted { initial: String, max: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_provider(config)?;
    validate_http(config)?;
    validate_retry(config)?;
    Ok(())
}

fn validate_provider(config: &Config) -> Result<(), ValidationError> {
    match config.provider.token.as_deref() {
        Some(token) if !token.trim().is_empty() => {}
        _ => return Err(ValidationError::MissingToken),
    }

    let url = config.provider.base_url.trim();
    let has_host = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty());
    if !has_host {
        return Err(ValidationError::InvalidBaseUrl {
            url: config.provider.base_url.clone(),
        });
    }

    Ok(())
}

fn validate_http(config: &Config) -> Result<(), ValidationError> {
    if config.http.connect_timeout.is_zero() {
        return Err(ValidationError::ZeroDuration {
            field: "http.connect_timeout".to_string(),
        });
    }
    if config.http.request_timeout.is_zero() {
        return Err(ValidationError::ZeroDuration {
            field: "http.request_timeout".to_string(),
        });
    }
    Ok(())
}

/// max_elapsed may be zero, which disables retrying
fn validate_retry(config: &Config) -> Result<(), ValidationError> {
    let retry = &config.retry;
    if retry.initial_interval.is_zero() {
        return Err(ValidationError::ZeroDuration {
            field: "retry.initial_interval".to_string(),
        });
    }
    if retry.max_interval < retry.initial_interval {
        return Err(ValidationError::RetryIntervalsInverted {
            initial: retry.initial_interval.to_string(),
            max: retry.max_interval.to_string(),
        });
    }
    Ok(())
}

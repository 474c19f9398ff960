use super::models::Config;
use crate::humanize::HumanDuration;
use reqwest::header::HeaderValue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} must be an http/https url, got '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("{field} is not a valid header value")]
    InvalidHeaderValue { field: &'static str },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_upstream(config)?;
    validate_firestore(config)?;
    validate_youtube(config)?;
    validate_bilibili(config)?;
    Ok(())
}

fn validate_upstream(config: &Config) -> Result<(), ValidationError> {
    require_timeout("upstream.request_timeout", config.upstream.request_timeout)?;
    require_timeout("upstream.connect_timeout", config.upstream.connect_timeout)
}

fn validate_firestore(config: &Config) -> Result<(), ValidationError> {
    require_non_empty("firestore.project_id", &config.firestore.project_id)?;
    require_non_empty("firestore.database", &config.firestore.database)?;
    require_non_empty("firestore.collection", &config.firestore.collection)?;
    require_http_url("firestore.base_url", &config.firestore.base_url)
}

fn validate_youtube(config: &Config) -> Result<(), ValidationError> {
    require_http_url("youtube.base_url", &config.youtube.base_url)
}

fn validate_bilibili(config: &Config) -> Result<(), ValidationError> {
    require_http_url("bilibili.api_base_url", &config.bilibili.api_base_url)?;
    require_timeout("bilibili.proxy_timeout", config.bilibili.proxy_timeout)?;

    // The referer is mandatory upstream; an empty one gets the request rejected
    require_non_empty("bilibili.referer", &config.bilibili.referer)?;
    require_header_value("bilibili.referer", &config.bilibili.referer)?;
    require_header_value("bilibili.user_agent", &config.bilibili.user_agent)
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

fn require_http_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn require_timeout(field: &'static str, value: HumanDuration) -> Result<(), ValidationError> {
    if value.is_zero() {
        return Err(ValidationError::ZeroTimeout { field });
    }
    Ok(())
}

fn require_header_value(field: &'static str, value: &str) -> Result<(), ValidationError> {
    HeaderValue::from_str(value)
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidHeaderValue { field })
}

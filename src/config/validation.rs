//! Configuration validation.
//!
//! Returns every problem found, not just the first. Runs before a config is
//! accepted into the system.

use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in a config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed config.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "server.request_timeout_secs",
            "must be greater than 0",
        ));
    }

    if tracing::Level::from_str(&config.logging.level).is_err() {
        errors.push(ValidationError::new(
            "logging.level",
            format!("'{}' is not a log level", config.logging.level),
        ));
    }

    if config.project.env_var.trim().is_empty() {
        errors.push(ValidationError::new("project.env_var", "must not be empty"));
    }

    if config.project.metadata_enabled {
        if let Err(e) = url::Url::parse(&config.project.metadata_url) {
            errors.push(ValidationError::new(
                "project.metadata_url",
                format!("invalid URL: {e}"),
            ));
        }

        if config.project.timeout_ms == 0 {
            errors.push(ValidationError::new(
                "project.timeout_ms",
                "must be greater than 0",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.server.bind_address = "nowhere".to_string();
        config.logging.level = "loud".to_string();
        config.project.env_var = " ".to_string();
        config.project.metadata_url = "not a url".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "server.bind_address",
                "logging.level",
                "project.env_var",
                "project.metadata_url",
            ]
        );
    }

    #[test]
    fn test_metadata_settings_ignored_when_disabled() {
        let mut config = AppConfig::default();
        config.project.metadata_enabled = false;
        config.project.metadata_url = String::new();
        config.project.timeout_ms = 0;
        assert!(validate_config(&config).is_ok());
    }
}

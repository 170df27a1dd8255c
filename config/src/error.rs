//! Configuration errors.

use errors::HttpException;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Configuration not loaded: call load() before reading configuration")]
    NotLoaded,

    #[error("Configuration validation failed: {}", .errors.join("; "))]
    Validation { errors: Vec<String> },

    #[error("Configuration key not found: {path}")]
    KeyNotFound { path: String },

    #[error("Configuration value at {path} has an unexpected shape: {reason}")]
    InvalidValue { path: String, reason: String },
}

impl ConfigError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotLoaded => "CONFIG_NOT_LOADED",
            Self::Validation { .. } => "CONFIG_VALIDATION_FAILED",
            Self::KeyNotFound { .. } => "CONFIG_KEY_NOT_FOUND",
            Self::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
        }
    }
}

/// Validation errors and key paths go to the logged context, not the body.
impl From<ConfigError> for HttpException {
    fn from(err: ConfigError) -> Self {
        let code = err.error_code();
        match err {
            ConfigError::NotLoaded => HttpException::service_unavailable(code, err.to_string()),
            ConfigError::Validation { errors } => {
                HttpException::internal(code, "Configuration is invalid").with_context("errors", errors)
            }
            ConfigError::KeyNotFound { path } => {
                HttpException::internal(code, "Configuration value is missing").with_context("path", path)
            }
            ConfigError::InvalidValue { path, reason } => {
                HttpException::internal(code, "Configuration value is invalid")
                    .with_context("path", path)
                    .with_context("reason", reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_errors() {
        let err = ConfigError::Validation {
            errors: vec!["api.port: range".to_string(), "auth.jwt_secret: too short".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Configuration validation failed: api.port: range; auth.jwt_secret: too short"
        );
    }

    #[test]
    fn test_into_http_exception() {
        let exception = HttpException::from(ConfigError::NotLoaded);
        assert_eq!(exception.status().as_u16(), 503);
        assert_eq!(exception.error_code(), "CONFIG_NOT_LOADED");

        let exception = HttpException::from(ConfigError::Validation {
            errors: vec!["x".to_string()],
        });
        assert_eq!(exception.status().as_u16(), 500);
        assert_eq!(exception.message(), Some("Configuration is invalid"));
        assert!(exception.data().is_none());
        assert_eq!(exception.context()["errors"][0], "x");
    }
}

//! Database errors.
//!
//! Every variant carries a JSON `context` object with the details needed to
//! diagnose the failure (driver, host, migration version...). Secrets never
//! go into the context.

use errors::HttpException;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatabaseError {
    #[error("Database connection failed ({driver}): {message}")]
    Connection {
        driver: String,
        message: String,
        context: Map<String, Value>,
    },

    #[error("Database migration failed: {message}")]
    Migration {
        message: String,
        context: Map<String, Value>,
    },

    #[error("Invalid database configuration: {message}")]
    Config {
        message: String,
        context: Map<String, Value>,
    },
}

impl DatabaseError {
    pub fn connection(driver: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            driver: driver.into(),
            message: message.into(),
            context: Map::new(),
        }
    }

    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration {
            message: message.into(),
            context: Map::new(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Map::new(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let context = match &mut self {
            Self::Connection { context, .. }
            | Self::Migration { context, .. }
            | Self::Config { context, .. } => context,
        };
        context.insert(key.into(), value.into());
        self
    }

    pub fn context(&self) -> &Map<String, Value> {
        match self {
            Self::Connection { context, .. }
            | Self::Migration { context, .. }
            | Self::Config { context, .. } => context,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "DB_CONNECTION_FAILED",
            Self::Migration { .. } => "DB_MIGRATION_FAILED",
            Self::Config { .. } => "DB_CONFIG_INVALID",
        }
    }
}

/// The client sees the error code and a generic message; the driver error
/// and the context stay on the exception's logged context.
impl From<DatabaseError> for HttpException {
    fn from(err: DatabaseError) -> Self {
        let code = err.error_code();
        let exception = match &err {
            DatabaseError::Connection { driver, message, .. } => {
                HttpException::service_unavailable(code, "Database is unavailable")
                    .with_context("driver", driver.clone())
                    .with_context("cause", message.clone())
            }
            DatabaseError::Migration { message, .. } => {
                HttpException::internal(code, "Database migration failed")
                    .with_context("cause", message.clone())
            }
            DatabaseError::Config { message, .. } => {
                HttpException::internal(code, "Database configuration is invalid")
                    .with_context("cause", message.clone())
            }
        };
        err.context()
            .iter()
            .fold(exception, |exception, (key, value)| {
                exception.with_context(key.clone(), value.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_messages() {
        let err = DatabaseError::connection("postgresql", "refused");
        assert_eq!(err.error_code(), "DB_CONNECTION_FAILED");
        assert_eq!(err.to_string(), "Database connection failed (postgresql): refused");

        assert_eq!(DatabaseError::migration("x").error_code(), "DB_MIGRATION_FAILED");
        assert_eq!(DatabaseError::config("x").error_code(), "DB_CONFIG_INVALID");
    }

    #[test]
    fn test_context_accumulates() {
        let err = DatabaseError::connection("mongodb", "timeout")
            .with_context("host", "db.internal")
            .with_context("port", 27017);

        assert_eq!(err.context()["host"], "db.internal");
        assert_eq!(err.context()["port"], 27017);
    }

    #[test]
    fn test_into_http_exception() {
        let exception = HttpException::from(
            DatabaseError::connection("postgresql", "refused").with_context("host", "db"),
        );
        assert_eq!(exception.status().as_u16(), 503);
        assert_eq!(exception.error_code(), "DB_CONNECTION_FAILED");
        assert_eq!(exception.context()["host"], "db");
        assert_eq!(exception.context()["cause"], "refused");

        let exception = HttpException::from(DatabaseError::migration("bad checksum"));
        assert_eq!(exception.status().as_u16(), 500);
    }

    #[test]
    fn test_connection_details_stay_out_of_response() {
        let exception = HttpException::from(
            DatabaseError::connection("postgresql", "refused")
                .with_context("host", "db-primary.internal.corp")
                .with_context("port", 5432)
                .with_context("database", "billing"),
        );

        let problem =
            errors::ExceptionFilter::default().catch(&exception, &errors::RequestInfo::new("req-1"));
        let body = serde_json::to_string(&problem).unwrap();
        assert!(problem.data.is_none());
        assert_eq!(problem.detail, "Database is unavailable");
        assert!(!body.contains("db-primary.internal.corp"));
        assert!(!body.contains("refused"));
    }
}

//! # Subscriber Setup
//!
//! Installs the global `tracing` subscriber. `RUST_LOG` wins over the
//! configured level when it is set, as in any `EnvFilter`-based setup.

use crate::{Logger, LoggingError};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Output encoding of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Compact,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" | "text" => Ok(Self::Compact),
            other => Err(LoggingError::UnknownFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// Options accepted by [`init`] and [`LoggerModule::for_root`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingOptions {
    /// `EnvFilter` directive, e.g. `info` or `info,sqlx=warn`
    pub level: String,
    pub format: LogFormat,
    /// Include source file and line in each event
    pub include_location: bool,
    /// Name of the root logger returned by `for_root`
    pub service_name: String,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            include_location: false,
            service_name: "app".to_string(),
        }
    }
}

fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidLevel {
        level: level.to_string(),
        reason: e.to_string(),
    })
}

/// Install the global subscriber.
///
/// Returns `LoggingError::AlreadyInitialized` when a global subscriber is
/// already set, so tests and embedders can call it unconditionally.
pub fn init(options: &LoggingOptions) -> Result<(), LoggingError> {
    let filter = build_filter(&options.level)?;
    let registry = tracing_subscriber::registry().with(filter);
    let location = options.include_location;

    let result = match options.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_file(location)
                    .with_line_number(location),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_file(location)
                    .with_line_number(location),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_file(location)
                    .with_line_number(location),
            )
            .try_init(),
    };

    result.map_err(|e| LoggingError::AlreadyInitialized {
        reason: e.to_string(),
    })
}

/// Module-style entry point mirroring the other packages.
pub struct LoggerModule;

impl LoggerModule {
    /// Install the subscriber and return the root logger.
    ///
    /// An already-installed subscriber is not an error here: the module may
    /// be initialised by several packages in the same process.
    pub fn for_root(options: LoggingOptions) -> Result<Logger, LoggingError> {
        match init(&options) {
            Ok(()) | Err(LoggingError::AlreadyInitialized { .. }) => {}
            Err(e) => return Err(e),
        }
        Ok(Logger::new(options.service_name))
    }

    pub async fn for_root_async<F>(options: F) -> Result<Logger, LoggingError>
    where
        F: Future<Output = LoggingOptions>,
    {
        Self::for_root(options.await)
    }
}

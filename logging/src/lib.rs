//! # Platform Logging
//!
//! Thin layer over `tracing` that gives every package the same logging
//! surface:
//! - Subscriber installation (`init`) with JSON, pretty or compact output
//! - Request-scoped context carried in a task-local (`context`)
//! - A named `Logger` that stamps each event with the current request
//! - An axum middleware that opens the request scope (`middleware`)

pub mod context;
pub mod init;
pub mod logger;
pub mod middleware;

pub use context::{RequestContext, current, current_request_id, scope, sync_scope};
pub use init::{LogFormat, LoggerModule, LoggingOptions, init};
pub use logger::Logger;

use thiserror::Error;

/// Logging setup errors
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log level directive '{level}': {reason}")]
    InvalidLevel { level: String, reason: String },

    #[error("Unknown log format: {format}")]
    UnknownFormat { format: String },

    #[error("Global subscriber already installed: {reason}")]
    AlreadyInitialized { reason: String },
}

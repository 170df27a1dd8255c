//! # Platform Exceptions
//!
//! Error handling shared by every HTTP-facing package.
//!
//! This crate provides:
//! - `HttpException`: the base error carrying status, machine-readable
//!   error code, message parameters and diagnostic context
//! - `ProblemDetails`: the RFC7807 response body
//! - `MessageProvider`: pluggable title/detail lookup by error code
//! - `ExceptionFilter`: turns any caught error into a problem-details body,
//!   logging it on the way
//!
//! Follows the same conventions as the rest of the workspace:
//! - Uses `thiserror` for structured error definitions
//! - Never panics while building an error response

pub mod exception;
pub mod filter;
pub mod message;
pub mod problem;

pub use exception::HttpException;
pub use filter::{ExceptionFilter, ExceptionsModule, ExceptionsOptions, RequestInfo};
pub use message::{MessageEntry, MessageField, MessageProvider, StaticMessageProvider};
pub use problem::{PROBLEM_JSON_CONTENT_TYPE, ProblemDetails};

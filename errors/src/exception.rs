//! # Base HTTP Exception
//!
//! `HttpException` is the error type every package converts into when an
//! error has to reach an HTTP client. Domain error enums (database,
//! config, ...) implement `From<...> for HttpException`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use thiserror::Error;

use crate::filter::{ExceptionFilter, RequestInfo};

/// HTTP-mappable error with a machine-readable code.
///
/// ## Fields
/// - `status`: HTTP status of the response
/// - `error_code`: stable identifier, e.g. `USER_NOT_FOUND`
/// - `message`: static fallback message, may contain `{param}` placeholders
/// - `params`: values substituted into message templates
/// - `data`: extra payload returned to the client as `data`
/// - `context`: diagnostics that are logged but never returned
/// - `type_uri`: explicit RFC7807 `type`, overriding the documentation URL
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error_code} ({status}): {}", .message.as_deref().unwrap_or("no message"))]
pub struct HttpException {
    status: StatusCode,
    error_code: String,
    message: Option<String>,
    params: HashMap<String, String>,
    data: Option<Value>,
    context: Map<String, Value>,
    type_uri: Option<String>,
}

impl HttpException {
    pub fn new(status: StatusCode, error_code: impl Into<String>) -> Self {
        Self {
            status,
            error_code: error_code.into(),
            message: None,
            params: HashMap::new(),
            data: None,
            context: Map::new(),
            type_uri: None,
        }
    }

    pub fn bad_request(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_code).with_message(message)
    }

    pub fn unauthorized(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error_code).with_message(message)
    }

    pub fn forbidden(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, error_code).with_message(message)
    }

    pub fn not_found(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error_code).with_message(message)
    }

    pub fn conflict(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, error_code).with_message(message)
    }

    pub fn unprocessable(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, error_code).with_message(message)
    }

    pub fn internal(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error_code).with_message(message)
    }

    pub fn service_unavailable(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, error_code).with_message(message)
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_type(mut self, type_uri: impl Into<String>) -> Self {
        self.type_uri = Some(type_uri.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn error_code(&self) -> &str {
        &self.error_code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    pub fn type_uri(&self) -> Option<&str> {
        self.type_uri.as_deref()
    }

    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }
}

/// Render with the default filter, taking the instance from the current
/// request context.
impl IntoResponse for HttpException {
    fn into_response(self) -> Response {
        ExceptionFilter::default().respond(&self, &RequestInfo::from_context())
    }
}

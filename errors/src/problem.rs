//! RFC7807 problem-details body.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PROBLEM_JSON_CONTENT_TYPE: &str = "application/problem+json";

pub const ABOUT_BLANK: &str = "about:blank";

/// Error code of the generic fallback body.
pub const INTERNAL_SERVER_ERROR_CODE: &str = "INTERNAL_SERVER_ERROR";

/// Problem-details response body.
///
/// ```json
/// { "type": "about:blank", "title": "Not Found", "detail": "...",
///   "status": 404, "instance": "<request id>", "errorCode": "NOT_FOUND" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub type_uri: String,
    pub title: String,
    pub detail: String,
    pub status: u16,
    /// Request id of the failed request
    pub instance: String,
    pub error_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProblemDetails {
    /// The generic 500 body used when nothing better is known.
    pub fn internal(instance: impl Into<String>) -> Self {
        Self {
            type_uri: ABOUT_BLANK.to_string(),
            title: "Internal Server Error".to_string(),
            detail: "An unexpected error occurred".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            instance: instance.into(),
            error_code: INTERNAL_SERVER_ERROR_CODE.to_string(),
            data: None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (
            status,
            [(header::CONTENT_TYPE, PROBLEM_JSON_CONTENT_TYPE)],
            Json(self),
        )
            .into_response()
    }
}

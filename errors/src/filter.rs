//! # Exception Filter
//!
//! Converts caught errors into RFC7807 bodies and logs them.
//!
//! ## Resolution order for `title` / `detail`
//! 1. The configured `MessageProvider` entry for the error code
//! 2. The exception's own message (detail) / the status reason (title)
//! 3. The generic 500 body when the exception carries no message at all
//!
//! Templates are rendered with `utils::interpolate`: the first occurrence of
//! each `{param}` is replaced, unknown placeholders stay verbatim.

use axum::response::{IntoResponse, Response};
use logging::Logger;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::Level;

use crate::exception::HttpException;
use crate::message::{MessageField, MessageProvider};
use crate::problem::{ABOUT_BLANK, ProblemDetails};

const REDACTED_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie", "x-api-key"];

/// Options of the exceptions package.
///
/// ## Fields
/// - `documentation_url`: base URL for the RFC7807 `type`
///   (`<base>/<kebab-error-code>`); `about:blank` when unset
/// - `log_level`: level used for client errors (4xx); 5xx always log at
///   `ERROR`
/// - `enable_stack_trace`: include the error chain under `data.trace`
/// - `message_provider`: title/detail lookup by error code
#[derive(Clone)]
pub struct ExceptionsOptions {
    pub documentation_url: Option<String>,
    pub log_level: Level,
    pub enable_stack_trace: bool,
    pub message_provider: Option<Arc<dyn MessageProvider>>,
}

impl Default for ExceptionsOptions {
    fn default() -> Self {
        Self {
            documentation_url: None,
            log_level: Level::WARN,
            enable_stack_trace: false,
            message_provider: None,
        }
    }
}

impl fmt::Debug for ExceptionsOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionsOptions")
            .field("documentation_url", &self.documentation_url)
            .field("log_level", &self.log_level)
            .field("enable_stack_trace", &self.enable_stack_trace)
            .field("message_provider", &self.message_provider.is_some())
            .finish()
    }
}

/// The request an error occurred in, as far as the filter needs it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestInfo {
    pub id: String,
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl RequestInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Build from the current logging request context; the id is generated
    /// when no context is active.
    pub fn from_context() -> Self {
        match logging::current() {
            Some(ctx) => Self {
                id: ctx.request_id,
                method: ctx.method.unwrap_or_default(),
                url: ctx.path.unwrap_or_default(),
                ..Self::default()
            },
            None => Self::new(utils::generate_uuid()),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Headers with credentials replaced, safe to log.
    pub fn redacted_headers(&self) -> BTreeMap<String, String> {
        self.headers
            .iter()
            .map(|(name, value)| {
                if REDACTED_HEADERS.contains(&name.as_str()) {
                    (name.clone(), "[REDACTED]".to_string())
                } else {
                    (name.clone(), value.clone())
                }
            })
            .collect()
    }
}

/// Maps exceptions to problem-details bodies.
#[derive(Debug, Clone)]
pub struct ExceptionFilter {
    options: ExceptionsOptions,
    logger: Logger,
}

impl Default for ExceptionFilter {
    fn default() -> Self {
        Self::new(ExceptionsOptions::default())
    }
}

impl ExceptionFilter {
    pub fn new(options: ExceptionsOptions) -> Self {
        Self {
            options,
            logger: Logger::new("ExceptionFilter"),
        }
    }

    pub fn options(&self) -> &ExceptionsOptions {
        &self.options
    }

    /// Problem body for a known `HttpException`.
    pub fn catch(&self, exception: &HttpException, request: &RequestInfo) -> ProblemDetails {
        let problem = self.build(exception, request);
        self.log_exception(exception, &problem, request);
        problem
    }

    /// Problem body for an arbitrary error; `HttpException`s are recognised
    /// through downcasting, everything else becomes the generic 500.
    pub fn catch_any(
        &self,
        error: &(dyn std::error::Error + 'static),
        request: &RequestInfo,
    ) -> ProblemDetails {
        match error.downcast_ref::<HttpException>() {
            Some(exception) => self.catch(exception, request),
            None => self.catch_unknown(error, request),
        }
    }

    /// Generic 500 for an unrecognised error, logged with full request
    /// context.
    pub fn catch_unknown(
        &self,
        error: &(dyn std::error::Error + 'static),
        request: &RequestInfo,
    ) -> ProblemDetails {
        let chain = logging::logger::error_chain(error);
        self.logger
            .child("request_id", &request.id)
            .child("method", &request.method)
            .child("url", &request.url)
            .child("headers", json!(request.redacted_headers()))
            .child(
                "body",
                request.body.as_ref().map_or(Value::Null, Clone::clone),
            )
            .child("error", &chain)
            .error("Unhandled error");

        let mut problem = ProblemDetails::internal(&request.id);
        if self.options.enable_stack_trace {
            problem.data = Some(json!({ "trace": logging::logger::error_sources(error) }));
        }
        problem
    }

    /// `catch` followed by conversion into an axum response.
    pub fn respond(&self, exception: &HttpException, request: &RequestInfo) -> Response {
        self.catch(exception, request).into_response()
    }

    fn build(&self, exception: &HttpException, request: &RequestInfo) -> ProblemDetails {
        let code = exception.error_code();
        let params = exception.params();

        let detail = self
            .lookup(code, MessageField::Detail)
            .or_else(|| exception.message().map(str::to_string))
            .map(|template| utils::interpolate(&template, params));

        let Some(detail) = detail else {
            return ProblemDetails::internal(&request.id);
        };

        let title = self
            .lookup(code, MessageField::Title)
            .map(|template| utils::interpolate(&template, params))
            .unwrap_or_else(|| {
                exception
                    .status()
                    .canonical_reason()
                    .unwrap_or("Error")
                    .to_string()
            });

        ProblemDetails {
            type_uri: self.type_uri(exception),
            title,
            detail,
            status: exception.status().as_u16(),
            instance: request.id.clone(),
            error_code: code.to_string(),
            data: self.data(exception),
        }
    }

    fn lookup(&self, code: &str, field: MessageField) -> Option<String> {
        self.options
            .message_provider
            .as_ref()
            .and_then(|provider| provider.message(code, field))
    }

    fn type_uri(&self, exception: &HttpException) -> String {
        if let Some(explicit) = exception.type_uri() {
            return explicit.to_string();
        }
        match &self.options.documentation_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                utils::to_kebab_case(exception.error_code())
            ),
            None => ABOUT_BLANK.to_string(),
        }
    }

    fn data(&self, exception: &HttpException) -> Option<Value> {
        if !self.options.enable_stack_trace {
            return exception.data().cloned();
        }
        let trace = json!({ "trace": logging::logger::error_sources(exception) });
        Some(match exception.data() {
            Some(data) => utils::deep_merge(data.clone(), trace),
            None => trace,
        })
    }

    fn log_exception(&self, exception: &HttpException, problem: &ProblemDetails, request: &RequestInfo) {
        let level = if exception.is_server_error() {
            Level::ERROR
        } else {
            self.options.log_level
        };

        self.logger
            .child("request_id", &request.id)
            .child("method", &request.method)
            .child("url", &request.url)
            .child("status", problem.status)
            .child("error_code", &problem.error_code)
            .child("context", Value::Object(exception.context().clone()))
            .log(level, &problem.detail);
    }
}

/// Module-style entry point mirroring the other packages.
pub struct ExceptionsModule;

impl ExceptionsModule {
    pub fn for_root(options: ExceptionsOptions) -> ExceptionFilter {
        ExceptionFilter::new(options)
    }

    pub async fn for_root_async<F>(options: F) -> ExceptionFilter
    where
        F: Future<Output = ExceptionsOptions>,
    {
        Self::for_root(options.await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::StaticMessageProvider;
    use axum::http::StatusCode;

    fn request() -> RequestInfo {
        RequestInfo::new("req-123")
            .with_header("Authorization", "Bearer secret")
            .with_header("Accept", "application/json")
    }

    #[test]
    fn test_not_found_without_provider() {
        let filter = ExceptionFilter::default();
        let exc = HttpException::not_found("NOT_FOUND", "resource does not exist");

        let problem = filter.catch(&exc, &request());

        assert_eq!(problem.status, 404);
        assert_eq!(problem.error_code, "NOT_FOUND");
        assert_eq!(problem.instance, "req-123");
        assert_eq!(problem.title, "Not Found");
        assert_eq!(problem.detail, "resource does not exist");
        assert_eq!(problem.type_uri, "about:blank");
        assert!(problem.data.is_none());
    }

    #[test]
    fn test_provider_message_with_substitution() {
        let provider = StaticMessageProvider::new().with_message(
            "USER_NOT_FOUND",
            "User {userId} not found",
            "does not exist: {userId}",
        );
        let filter = ExceptionFilter::new(ExceptionsOptions {
            message_provider: Some(Arc::new(provider)),
            ..ExceptionsOptions::default()
        });
        let exc = HttpException::not_found("USER_NOT_FOUND", "fallback").with_param("userId", "u-1");

        let problem = filter.catch(&exc, &request());

        assert_eq!(problem.title, "User u-1 not found");
        assert_eq!(problem.detail, "does not exist: u-1");
    }

    #[test]
    fn test_unmatched_placeholder_left_verbatim() {
        let filter = ExceptionFilter::default();
        let exc = HttpException::bad_request("INVALID", "bad {field} in {section}")
            .with_param("field", "email");

        let problem = filter.catch(&exc, &request());
        assert_eq!(problem.detail, "bad email in {section}");
    }

    #[test]
    fn test_provider_miss_falls_back_to_exception_message() {
        let filter = ExceptionFilter::new(ExceptionsOptions {
            message_provider: Some(Arc::new(StaticMessageProvider::new())),
            ..ExceptionsOptions::default()
        });
        let exc = HttpException::conflict("EMAIL_TAKEN", "email already registered");

        let problem = filter.catch(&exc, &request());
        assert_eq!(problem.detail, "email already registered");
        assert_eq!(problem.title, "Conflict");
    }

    #[test]
    fn test_no_message_anywhere_yields_generic_500() {
        let filter = ExceptionFilter::default();
        let exc = HttpException::new(StatusCode::NOT_FOUND, "SILENT");

        let problem = filter.catch(&exc, &request());
        assert_eq!(problem, ProblemDetails::internal("req-123"));
    }

    #[test]
    fn test_documentation_url_builds_type() {
        let filter = ExceptionFilter::new(ExceptionsOptions {
            documentation_url: Some("https://docs.example.com/errors/".to_string()),
            ..ExceptionsOptions::default()
        });
        let exc = HttpException::not_found("USER_NOT_FOUND", "missing");

        let problem = filter.catch(&exc, &request());
        assert_eq!(problem.type_uri, "https://docs.example.com/errors/user-not-found");

        let explicit = exc.with_type("https://example.com/custom");
        assert_eq!(filter.catch(&explicit, &request()).type_uri, "https://example.com/custom");
    }

    #[test]
    fn test_stack_trace_merged_into_data() {
        let filter = ExceptionFilter::new(ExceptionsOptions {
            enable_stack_trace: true,
            ..ExceptionsOptions::default()
        });
        let exc = HttpException::bad_request("INVALID", "bad input").with_data(json!({"field": "email"}));

        let data = filter.catch(&exc, &request()).data.unwrap();
        assert_eq!(data["field"], "email");
        assert_eq!(data["trace"][0], "INVALID (400 Bad Request): bad input");
    }

    #[test]
    fn test_catch_any_downcasts_http_exception() {
        let filter = ExceptionFilter::default();
        let exc = HttpException::forbidden("FORBIDDEN", "no access");

        let problem = filter.catch_any(&exc, &request());
        assert_eq!(problem.status, 403);
    }

    #[test]
    fn test_catch_any_unknown_error_is_generic_500() {
        let filter = ExceptionFilter::default();
        let err = std::io::Error::new(std::io::ErrorKind::Other, "socket closed");

        let problem = filter.catch_any(&err, &request());
        assert_eq!(problem.status, 500);
        assert_eq!(problem.instance, "req-123");
        assert!(problem.data.is_none());
    }

    #[test]
    fn test_redacted_headers() {
        let headers = request().redacted_headers();
        assert_eq!(headers["authorization"], "[REDACTED]");
        assert_eq!(headers["accept"], "application/json");
    }

    #[test]
    fn test_request_info_from_context() {
        let ctx = logging::RequestContext::new("ctx-id").with_http("POST", "/users");
        let info = logging::sync_scope(ctx, RequestInfo::from_context);

        assert_eq!(info.id, "ctx-id");
        assert_eq!(info.method, "POST");
        assert_eq!(info.url, "/users");
    }

    #[tokio::test]
    async fn test_for_root_async() {
        let filter = ExceptionsModule::for_root_async(async {
            ExceptionsOptions {
                enable_stack_trace: true,
                ..ExceptionsOptions::default()
            }
        })
        .await;
        assert!(filter.options().enable_stack_trace);
    }
}

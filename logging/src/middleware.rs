//! Axum middleware opening a request scope, plus the request trace layer.
//!
//! ```rust,no_run
//! use axum::{Router, middleware, routing::get};
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "ok" }))
//!     .layer(logging::middleware::trace_layer())
//!     .layer(middleware::from_fn(logging::middleware::request_context));
//! ```
//!
//! `request_context` must wrap the trace layer so the span sees the
//! request id it assigns.

use crate::context::{self, RequestContext};
use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;
use tracing::Span;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub type RequestTraceLayer =
    TraceLayer<SharedClassifier<ServerErrorsAsFailures>, fn(&Request) -> Span>;

/// Reuse the caller's `x-request-id` (or generate one), run the rest of the
/// stack inside that request context and echo the id on the response.
pub async fn request_context(mut request: Request, next: Next) -> Response {
    let incoming = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string);

    let request_id = match incoming {
        Some(id) => id,
        None => {
            let id = utils::generate_uuid();
            if let Ok(value) = HeaderValue::from_str(&id) {
                request
                    .headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }
            id
        }
    };

    let ctx = RequestContext::new(request_id.clone())
        .with_http(request.method().as_str(), request.uri().path());

    let mut response = context::scope(ctx, next.run(request)).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

/// HTTP trace layer whose span carries the request id.
pub fn trace_layer() -> RequestTraceLayer {
    TraceLayer::new_for_http().make_span_with(request_span as fn(&Request) -> Span)
}

fn request_span(request: &Request) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

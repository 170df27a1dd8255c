//! HTTP routes owned by the platform itself.

use crate::Platform;
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use config::{ConfigHealthChecker, ConfigHealthReport};
use database::{ConnectionManager, DatabaseHealth};
use errors::{ExceptionFilter, HttpException, RequestInfo};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub config: ConfigHealthReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseHealth>,
}

#[derive(Clone)]
pub struct RouteState {
    checker: ConfigHealthChecker,
    database: Option<Arc<ConnectionManager>>,
    exceptions: Arc<ExceptionFilter>,
}

pub fn create_router(platform: &Platform) -> Router {
    let state = RouteState {
        checker: platform.config.health_checker().clone(),
        database: platform
            .database
            .as_ref()
            .map(|database| Arc::clone(database.manager())),
        exceptions: Arc::clone(&platform.exceptions),
    };

    let service = platform.config.service();
    let (prefix, health_enabled, request_logging) = match service.snapshot() {
        Ok(snapshot) => (
            snapshot.api.global_prefix.trim_matches('/').to_string(),
            snapshot.features.enable_health_check,
            snapshot.logging.request_logging,
        ),
        Err(_) => (String::new(), true, true),
    };

    let mut router = Router::new();
    if health_enabled {
        let path = if prefix.is_empty() {
            "/health".to_string()
        } else {
            format!("/{prefix}/health")
        };
        router = router.route(&path, get(health));
    }

    let mut router = router.fallback(not_found).with_state(state);
    if request_logging {
        router = router.layer(logging::middleware::trace_layer());
    }
    // Always scoped: problem details use the request id as `instance`.
    router.layer(middleware::from_fn(logging::middleware::request_context))
}

async fn health(State(state): State<RouteState>) -> impl IntoResponse {
    let config = state.checker.check();
    let database = match &state.database {
        Some(manager) => Some(manager.health().await),
        None => None,
    };

    let healthy = config.is_healthy && database.as_ref().is_none_or(|db| db.healthy);
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            config,
            database,
        }),
    )
}

async fn not_found(State(state): State<RouteState>, uri: Uri) -> Response {
    let exception = HttpException::not_found("ROUTE_NOT_FOUND", "No route for {path}")
        .with_param("path", uri.path());
    state
        .exceptions
        .respond(&exception, &RequestInfo::from_context())
}

//! # Request Context
//!
//! Request-scoped values (request id, method, path, user) stored in a
//! `tokio` task-local. Code running inside [`scope`] can read the context
//! without it being threaded through every call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;

tokio::task_local! {
    static REQUEST_CONTEXT: RequestContext;
}

/// Values bound to the request currently being served.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    pub request_id: String,
    pub method: Option<String>,
    pub path: Option<String>,
    pub user_id: Option<String>,
    /// Free-form fields added by application code
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            method: None,
            path: None,
            user_id: None,
            fields: BTreeMap::new(),
        }
    }

    /// Context with a freshly generated request id.
    pub fn generate() -> Self {
        Self::new(utils::generate_uuid())
    }

    pub fn with_http(mut self, method: impl Into<String>, path: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self.path = Some(path.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Run `future` with `ctx` as the current request context.
pub async fn scope<F>(ctx: RequestContext, future: F) -> F::Output
where
    F: Future,
{
    REQUEST_CONTEXT.scope(ctx, future).await
}

/// Synchronous counterpart of [`scope`].
pub fn sync_scope<R>(ctx: RequestContext, f: impl FnOnce() -> R) -> R {
    REQUEST_CONTEXT.sync_scope(ctx, f)
}

/// The current request context, if any.
pub fn current() -> Option<RequestContext> {
    REQUEST_CONTEXT.try_with(Clone::clone).ok()
}

pub fn current_request_id() -> Option<String> {
    REQUEST_CONTEXT.try_with(|ctx| ctx.request_id.clone()).ok()
}

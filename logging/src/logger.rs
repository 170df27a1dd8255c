//! # Named Logger
//!
//! `Logger` wraps the `tracing` macros so call sites get a component name,
//! static bindings and the current request context on every event.

use crate::context;
use std::collections::BTreeMap;
use std::fmt::Display;
use tracing::Level;

/// Component logger with bound fields.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    name: String,
    bindings: BTreeMap<String, String>,
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bindings(&self) -> &BTreeMap<String, String> {
        &self.bindings
    }

    /// Child logger sharing this logger's name and bindings plus one more.
    pub fn child(&self, key: impl Into<String>, value: impl Display) -> Self {
        let mut child = self.clone();
        child.bindings.insert(key.into(), value.to_string());
        child
    }

    pub fn trace(&self, message: impl Display) {
        self.log(Level::TRACE, message);
    }

    pub fn debug(&self, message: impl Display) {
        self.log(Level::DEBUG, message);
    }

    pub fn info(&self, message: impl Display) {
        self.log(Level::INFO, message);
    }

    pub fn warn(&self, message: impl Display) {
        self.log(Level::WARN, message);
    }

    pub fn error(&self, message: impl Display) {
        self.log(Level::ERROR, message);
    }

    /// Log an error together with its full `source()` chain.
    pub fn error_with(&self, message: impl Display, err: &(dyn std::error::Error + 'static)) {
        self.child("error", error_chain(err)).log(Level::ERROR, message);
    }

    /// Emit at a level chosen at runtime.
    pub fn log(&self, level: Level, message: impl Display) {
        let ctx = context::current();
        let request_id = ctx.as_ref().map_or("-", |c| c.request_id.as_str());
        let method = ctx.as_ref().and_then(|c| c.method.as_deref()).unwrap_or("-");
        let path = ctx.as_ref().and_then(|c| c.path.as_deref()).unwrap_or("-");
        let bindings = self.render_bindings();

        // tracing needs the level at compile time
        match level {
            Level::TRACE => tracing::trace!(
                context = %self.name, request_id, method, path, bindings = %bindings, "{message}"
            ),
            Level::DEBUG => tracing::debug!(
                context = %self.name, request_id, method, path, bindings = %bindings, "{message}"
            ),
            Level::INFO => tracing::info!(
                context = %self.name, request_id, method, path, bindings = %bindings, "{message}"
            ),
            Level::WARN => tracing::warn!(
                context = %self.name, request_id, method, path, bindings = %bindings, "{message}"
            ),
            _ => tracing::error!(
                context = %self.name, request_id, method, path, bindings = %bindings, "{message}"
            ),
        }
    }

    fn render_bindings(&self) -> String {
        if self.bindings.is_empty() {
            return String::new();
        }
        serde_json::to_string(&self.bindings).unwrap_or_default()
    }
}

/// An error followed by each of its sources, outermost first.
pub fn error_sources(err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts
}

/// `outer: middle: inner` rendering of an error and its sources.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    error_sources(err).join(": ")
}

//! # Environment Sources
//!
//! Where the loader reads variables from. The process environment is the
//! production source; maps are used by tests and embedders.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::str::FromStr;

/// A read-only view of environment variables.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// A mutable map, so a running service can observe changes on reload.
impl EnvSource for RwLock<HashMap<String, String>> {
    fn var(&self, key: &str) -> Option<String> {
        self.read().get(key).cloned()
    }
}

/// Typed reads with per-field defaults.
///
/// Absent and empty variables both mean "use the default"; so do numbers
/// and booleans that fail to parse.
pub(crate) struct EnvReader<'a> {
    source: &'a dyn EnvSource,
}

impl<'a> EnvReader<'a> {
    pub(crate) fn new(source: &'a dyn EnvSource) -> Self {
        Self { source }
    }

    fn raw(&self, key: &str) -> Option<String> {
        self.source.var(key).filter(|v| !v.is_empty())
    }

    pub(crate) fn string(&self, key: &str, default: &str) -> String {
        self.raw(key).unwrap_or_else(|| default.to_string())
    }

    /// First non-empty variable among `keys`.
    pub(crate) fn first_string(&self, keys: &[&str], default: &str) -> String {
        keys.iter()
            .find_map(|key| self.raw(key))
            .unwrap_or_else(|| default.to_string())
    }

    pub(crate) fn parse<T: FromStr>(&self, key: &str, default: T) -> T {
        self.raw(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    pub(crate) fn bool(&self, key: &str, default: bool) -> bool {
        self.raw(key)
            .and_then(|v| parse_bool(&v))
            .unwrap_or(default)
    }
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

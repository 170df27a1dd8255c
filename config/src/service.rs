//! # In-Memory Configuration Service
//!
//! Holds the current snapshot behind an `ArcSwapOption`. Readers take a
//! cheap `Arc` clone; a reload builds a complete new snapshot and swaps the
//! pointer, so nobody ever sees a half-updated config.

use crate::env::{EnvSource, ProcessEnv};
use crate::error::ConfigError;
use crate::loader::load_from;
use crate::schema::{
    ApiConfig, ApplicationMemoryConfig, AssetsConfig, AuthConfig, DatabaseConfig, FeaturesConfig,
    LoggingConfig, MongoDbConfig, RedisConfig,
};
use crate::validation::{ValidationReport, validate};
use arc_swap::ArcSwapOption;
use logging::Logger;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigState {
    NotLoaded,
    Loaded,
}

/// Owner of the configuration snapshot.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Single source of configuration for the process. Every accessor fails
/// with [`ConfigError::NotLoaded`] until [`load`](Self::load) has run.
///
/// ## Usage
/// ```rust
/// use config::MemoryConfigService;
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// let env: HashMap<String, String> = [("API_PORT".to_string(), "8080".to_string())].into();
/// let service = MemoryConfigService::with_source(Arc::new(env));
/// service.load();
///
/// assert_eq!(service.api().unwrap().port, 8080);
/// assert_eq!(service.get("api.port").unwrap(), Some(8080.into()));
/// ```
pub struct MemoryConfigService {
    source: Arc<dyn EnvSource>,
    current: ArcSwapOption<ApplicationMemoryConfig>,
    logger: Logger,
}

impl Default for MemoryConfigService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConfigService {
    /// Service reading the process environment.
    pub fn new() -> Self {
        Self::with_source(Arc::new(ProcessEnv))
    }

    pub fn with_source(source: Arc<dyn EnvSource>) -> Self {
        Self {
            source,
            current: ArcSwapOption::empty(),
            logger: Logger::new("MemoryConfigService"),
        }
    }

    /// Read the environment and install the resulting snapshot.
    pub fn load(&self) -> Arc<ApplicationMemoryConfig> {
        let snapshot = self.install();
        self.logger.info(format!(
            "Configuration loaded for environment '{}'",
            snapshot.environment
        ));
        snapshot
    }

    /// Same as [`load`](Self::load); the previous snapshot is replaced
    /// wholesale, never patched.
    pub fn reload(&self) -> Arc<ApplicationMemoryConfig> {
        let snapshot = self.install();
        self.logger.info(format!(
            "Configuration reloaded for environment '{}'",
            snapshot.environment
        ));
        snapshot
    }

    fn install(&self) -> Arc<ApplicationMemoryConfig> {
        let snapshot = Arc::new(load_from(self.source.as_ref()));
        self.current.store(Some(Arc::clone(&snapshot)));
        snapshot
    }

    pub fn state(&self) -> ConfigState {
        if self.current.load().is_some() {
            ConfigState::Loaded
        } else {
            ConfigState::NotLoaded
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state() == ConfigState::Loaded
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Result<Arc<ApplicationMemoryConfig>, ConfigError> {
        self.current.load_full().ok_or(ConfigError::NotLoaded)
    }

    /// Value at a dotted path such as `database.pool_max`.
    ///
    /// Returns `Ok(None)` for unknown paths, including empty paths and
    /// paths with empty segments.
    pub fn get(&self, path: &str) -> Result<Option<Value>, ConfigError> {
        let snapshot = self.snapshot()?;
        Self::lookup(&snapshot, path)
    }

    /// Dotted-path lookup inside a snapshot the caller already holds.
    pub fn lookup(
        snapshot: &ApplicationMemoryConfig,
        path: &str,
    ) -> Result<Option<Value>, ConfigError> {
        let tree = serde_json::to_value(snapshot).map_err(|e| ConfigError::InvalidValue {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(utils::get_path(&tree, path).cloned())
    }

    pub fn get_or(&self, path: &str, default: Value) -> Result<Value, ConfigError> {
        Ok(self.get(path)?.unwrap_or(default))
    }

    /// Value at `path`, failing when it is missing.
    pub fn get_required(&self, path: &str) -> Result<Value, ConfigError> {
        self.get(path)?.ok_or_else(|| ConfigError::KeyNotFound {
            path: path.to_string(),
        })
    }

    /// Value at `path` deserialized into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ConfigError> {
        self.get(path)?
            .map(|value| {
                serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
                    path: path.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    pub fn has(&self, path: &str) -> Result<bool, ConfigError> {
        Ok(self.get(path)?.is_some())
    }

    pub fn environment(&self) -> Result<String, ConfigError> {
        Ok(self.snapshot()?.environment.clone())
    }

    pub fn api(&self) -> Result<ApiConfig, ConfigError> {
        Ok(self.snapshot()?.api.clone())
    }

    pub fn database(&self) -> Result<DatabaseConfig, ConfigError> {
        Ok(self.snapshot()?.database.clone())
    }

    pub fn mongodb(&self) -> Result<MongoDbConfig, ConfigError> {
        Ok(self.snapshot()?.mongodb.clone())
    }

    pub fn redis(&self) -> Result<RedisConfig, ConfigError> {
        Ok(self.snapshot()?.redis.clone())
    }

    pub fn auth(&self) -> Result<AuthConfig, ConfigError> {
        Ok(self.snapshot()?.auth.clone())
    }

    pub fn assets(&self) -> Result<AssetsConfig, ConfigError> {
        Ok(self.snapshot()?.assets.clone())
    }

    pub fn logging(&self) -> Result<LoggingConfig, ConfigError> {
        Ok(self.snapshot()?.logging.clone())
    }

    pub fn features(&self) -> Result<FeaturesConfig, ConfigError> {
        Ok(self.snapshot()?.features.clone())
    }

    /// Validate the current snapshot.
    pub fn validate(&self) -> Result<ValidationReport, ConfigError> {
        let snapshot = self.snapshot()?;
        Ok(validate(&snapshot))
    }
}

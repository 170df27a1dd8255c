//! # Configuration System
//!
//! In-memory application configuration read from environment variables.
//!
//! This crate provides:
//! - A typed snapshot with eight sub-configs ([`ApplicationMemoryConfig`])
//! - Environment loading where every field has a default
//! - [`MemoryConfigService`], swapping whole snapshots on reload
//! - Dotted-path access through [`ConfigAdapter`]
//! - Validation, health checks and a periodic monitor
//!
//! # Best Practices
//!
//! - Uses `validator` crate for input validation
//! - Follows 12-factor app configuration principles
//! - Readers never observe a partially reloaded snapshot

pub mod adapter;
pub mod env;
pub mod error;
pub mod health;
pub mod loader;
pub mod module;
pub mod monitor;
pub mod schema;
pub mod service;
pub mod validation;

pub use adapter::ConfigAdapter;
pub use env::{EnvSource, ProcessEnv};
pub use error::ConfigError;
pub use health::{ConfigHealthChecker, ConfigHealthReport};
pub use loader::{load_from, load_from_env};
pub use module::{ConfigModule, ConfigModuleOptions};
pub use monitor::{ConfigMonitor, DEFAULT_MONITOR_INTERVAL, MonitorStats};
pub use schema::{
    ApiConfig, ApplicationMemoryConfig, AssetsConfig, AuthConfig, DatabaseConfig, FeaturesConfig,
    LoggingConfig, MIN_JWT_SECRET_LENGTH, MongoDbConfig, RedisConfig,
};
pub use service::{ConfigState, MemoryConfigService};
pub use validation::{ValidationReport, validate, validate_or_err};
pub use validator::Validate;

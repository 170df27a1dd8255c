//! # Configuration Structures
//!
//! The in-memory configuration snapshot and its eight sub-configs.
//!
//! All configuration structures:
//! - Use `serde` for serialization (the dotted-path accessor walks the
//!   serialized tree)
//! - Use `validator` for input validation
//! - Fall back to the values in [`defaults`] field by field

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

/// Default value of every field, shared by `Default` impls and the loader.
pub mod defaults {
    pub const ENVIRONMENT: &str = "development";

    pub const API_PORT: u16 = 3000;
    pub const API_HOST: &str = "0.0.0.0";
    pub const API_PREFIX: &str = "api";
    pub const API_CORS_ORIGINS: &str = "*";
    pub const API_REQUEST_TIMEOUT_MS: u64 = 30_000;
    pub const API_BODY_LIMIT_BYTES: u64 = 1_048_576;

    pub const DB_TYPE: &str = "postgresql";
    pub const DB_HOST: &str = "localhost";
    pub const DB_PORT: u16 = 5432;
    pub const DB_NAME: &str = "app";
    pub const DB_USER: &str = "postgres";
    pub const DB_PASSWORD: &str = "";
    pub const DB_POOL_MIN: u32 = 2;
    pub const DB_POOL_MAX: u32 = 10;
    pub const DB_SSL: bool = false;
    pub const DB_DEBUG: bool = false;
    pub const DB_CONNECT_TIMEOUT_MS: u64 = 10_000;
    pub const DB_MIGRATIONS_PATH: &str = "./migrations";

    pub const MONGODB_URI: &str = "mongodb://localhost:27017";
    pub const MONGODB_DATABASE: &str = "app";
    pub const MONGODB_MAX_POOL_SIZE: u32 = 10;
    pub const MONGODB_CONNECT_TIMEOUT_MS: u64 = 10_000;

    pub const REDIS_HOST: &str = "localhost";
    pub const REDIS_PORT: u16 = 6379;
    pub const REDIS_PASSWORD: &str = "";
    pub const REDIS_DB: u8 = 0;
    pub const REDIS_TTL_SECONDS: u64 = 3600;
    pub const REDIS_KEY_PREFIX: &str = "app:";

    pub const JWT_SECRET: &str = "";
    pub const JWT_EXPIRES_IN: &str = "1h";
    pub const JWT_REFRESH_EXPIRES_IN: &str = "7d";
    pub const BCRYPT_ROUNDS: u32 = 10;

    pub const ASSETS_STORAGE_PATH: &str = "./uploads";
    pub const ASSETS_MAX_FILE_SIZE: u64 = 10_485_760;
    pub const ASSETS_ALLOWED_MIME_TYPES: &str = "image/jpeg,image/png,image/webp,application/pdf";
    pub const ASSETS_CDN_URL: &str = "";

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_FORMAT: &str = "json";
    pub const LOG_REQUESTS: bool = true;
    pub const LOG_INCLUDE_LOCATION: bool = false;

    pub const ENABLE_SWAGGER: bool = true;
    pub const ENABLE_METRICS: bool = false;
    pub const ENABLE_HEALTH_CHECK: bool = true;
    pub const ENABLE_RATE_LIMIT: bool = true;
    pub const ENABLE_CACHE: bool = false;
}

/// Minimum accepted length of `auth.jwt_secret`.
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Root configuration snapshot.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Immutable view of the whole application configuration, built once from
/// the environment. A reload builds a new snapshot; an existing one is
/// never modified.
///
/// ## Usage
/// ```rust,no_run
/// use config::MemoryConfigService;
///
/// let service = MemoryConfigService::new();
/// let snapshot = service.load();
/// println!("API listening on {}:{}", snapshot.api.host, snapshot.api.port);
/// ```
///
/// ## Fields
/// - `version`: package version, static per build
/// - `environment`: `development`, `test`, `staging` or `production`
/// - `load_time`: when this snapshot was read from the environment
/// - eight sub-configs: `api`, `database`, `mongodb`, `redis`, `auth`,
///   `assets`, `logging`, `features`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ApplicationMemoryConfig {
    pub version: String,
    pub environment: String,
    pub load_time: DateTime<Utc>,

    #[validate(nested)]
    pub api: ApiConfig,

    #[validate(nested)]
    pub database: DatabaseConfig,

    #[validate(nested)]
    pub mongodb: MongoDbConfig,

    #[validate(nested)]
    pub redis: RedisConfig,

    #[validate(nested)]
    pub auth: AuthConfig,

    #[validate(nested)]
    pub assets: AssetsConfig,

    #[validate(nested)]
    pub logging: LoggingConfig,

    pub features: FeaturesConfig,
}

impl Default for ApplicationMemoryConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: defaults::ENVIRONMENT.to_string(),
            load_time: Utc::now(),
            api: ApiConfig::default(),
            database: DatabaseConfig::default(),
            mongodb: MongoDbConfig::default(),
            redis: RedisConfig::default(),
            auth: AuthConfig::default(),
            assets: AssetsConfig::default(),
            logging: LoggingConfig::default(),
            features: FeaturesConfig::default(),
        }
    }
}

impl ApplicationMemoryConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_test(&self) -> bool {
        self.environment == "test"
    }

    /// JSON tree with secrets masked, safe to log or expose.
    pub fn redacted(&self) -> Value {
        let mut tree = serde_json::to_value(self).unwrap_or_default();
        for (section, key) in [
            ("database", "password"),
            ("redis", "password"),
            ("auth", "jwt_secret"),
        ] {
            if let Some(Value::String(secret)) = tree.get_mut(section).and_then(|s| s.get_mut(key))
            {
                *secret = utils::mask(secret, 4);
            }
        }
        tree
    }
}

/// HTTP API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ApiConfig {
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,

    #[validate(length(min = 1, max = 255))]
    pub host: String,

    pub global_prefix: String,

    /// Comma-separated list, `*` for any origin
    pub cors_origins: String,

    #[validate(range(min = 1))]
    pub request_timeout_ms: u64,

    #[validate(range(min = 1))]
    pub body_limit_bytes: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: defaults::API_PORT,
            host: defaults::API_HOST.to_string(),
            global_prefix: defaults::API_PREFIX.to_string(),
            cors_origins: defaults::API_CORS_ORIGINS.to_string(),
            request_timeout_ms: defaults::API_REQUEST_TIMEOUT_MS,
            body_limit_bytes: defaults::API_BODY_LIMIT_BYTES,
        }
    }
}

impl ApiConfig {
    pub fn cors_origin_list(&self) -> Vec<String> {
        utils::compact(&self.cors_origins.split(',').collect::<Vec<_>>())
    }
}

/// Relational database settings.
///
/// ## Fields
/// - `db_type`: `postgresql` or `mongodb`
/// - `pool_min` / `pool_max`: connection pool bounds, `pool_min <= pool_max`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_pool_bounds"))]
pub struct DatabaseConfig {
    #[validate(custom(function = "validate_db_type"))]
    pub db_type: String,

    #[validate(length(min = 1, max = 255))]
    pub host: String,

    #[validate(range(min = 1, max = 65535))]
    pub port: u16,

    #[validate(length(min = 1, max = 63))]
    pub name: String,

    #[validate(length(min = 1, max = 63))]
    pub user: String,

    pub password: String,

    pub pool_min: u32,

    #[validate(range(min = 1, max = 100))]
    pub pool_max: u32,

    pub ssl: bool,

    pub debug: bool,

    #[validate(range(min = 1, max = 300_000))]
    pub connect_timeout_ms: u64,

    pub migrations_path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: defaults::DB_TYPE.to_string(),
            host: defaults::DB_HOST.to_string(),
            port: defaults::DB_PORT,
            name: defaults::DB_NAME.to_string(),
            user: defaults::DB_USER.to_string(),
            password: defaults::DB_PASSWORD.to_string(),
            pool_min: defaults::DB_POOL_MIN,
            pool_max: defaults::DB_POOL_MAX,
            ssl: defaults::DB_SSL,
            debug: defaults::DB_DEBUG,
            connect_timeout_ms: defaults::DB_CONNECT_TIMEOUT_MS,
            migrations_path: defaults::DB_MIGRATIONS_PATH.to_string(),
        }
    }
}

fn validate_db_type(value: &str) -> Result<(), ValidationError> {
    match value {
        "postgresql" | "postgres" | "mongodb" => Ok(()),
        _ => Err(ValidationError::new("invalid_db_type")),
    }
}

fn validate_pool_bounds(config: &DatabaseConfig) -> Result<(), ValidationError> {
    if config.pool_min > config.pool_max {
        return Err(ValidationError::new("pool_min_exceeds_pool_max"));
    }
    Ok(())
}

/// MongoDB settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct MongoDbConfig {
    #[validate(length(min = 1))]
    pub uri: String,

    #[validate(length(min = 1, max = 63))]
    pub database: String,

    #[validate(range(min = 1, max = 500))]
    pub max_pool_size: u32,

    #[validate(range(min = 1, max = 300_000))]
    pub connect_timeout_ms: u64,
}

impl Default for MongoDbConfig {
    fn default() -> Self {
        Self {
            uri: defaults::MONGODB_URI.to_string(),
            database: defaults::MONGODB_DATABASE.to_string(),
            max_pool_size: defaults::MONGODB_MAX_POOL_SIZE,
            connect_timeout_ms: defaults::MONGODB_CONNECT_TIMEOUT_MS,
        }
    }
}

/// Redis settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RedisConfig {
    #[validate(length(min = 1, max = 255))]
    pub host: String,

    #[validate(range(min = 1, max = 65535))]
    pub port: u16,

    pub password: String,

    #[validate(range(max = 15))]
    pub db: u8,

    pub ttl_seconds: u64,

    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: defaults::REDIS_HOST.to_string(),
            port: defaults::REDIS_PORT,
            password: defaults::REDIS_PASSWORD.to_string(),
            db: defaults::REDIS_DB,
            ttl_seconds: defaults::REDIS_TTL_SECONDS,
            key_prefix: defaults::REDIS_KEY_PREFIX.to_string(),
        }
    }
}

/// Authentication settings.
///
/// The JWT secret length is checked by the health checker everywhere and
/// by validation in production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,

    #[validate(length(min = 1))]
    pub jwt_expires_in: String,

    #[validate(length(min = 1))]
    pub refresh_expires_in: String,

    #[validate(range(min = 4, max = 31))]
    pub bcrypt_rounds: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: defaults::JWT_SECRET.to_string(),
            jwt_expires_in: defaults::JWT_EXPIRES_IN.to_string(),
            refresh_expires_in: defaults::JWT_REFRESH_EXPIRES_IN.to_string(),
            bcrypt_rounds: defaults::BCRYPT_ROUNDS,
        }
    }
}

/// Uploaded asset storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AssetsConfig {
    #[validate(length(min = 1))]
    pub storage_path: String,

    #[validate(range(min = 1))]
    pub max_file_size: u64,

    /// Comma-separated MIME types
    pub allowed_mime_types: String,

    pub cdn_url: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            storage_path: defaults::ASSETS_STORAGE_PATH.to_string(),
            max_file_size: defaults::ASSETS_MAX_FILE_SIZE,
            allowed_mime_types: defaults::ASSETS_ALLOWED_MIME_TYPES.to_string(),
            cdn_url: defaults::ASSETS_CDN_URL.to_string(),
        }
    }
}

impl AssetsConfig {
    pub fn allowed_mime_type_list(&self) -> Vec<String> {
        utils::compact(&self.allowed_mime_types.split(',').collect::<Vec<_>>())
    }

    pub fn is_mime_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_mime_type_list()
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(mime_type))
    }
}

/// Logging settings, mapped onto `logging::LoggingOptions` at boot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingConfig {
    #[validate(custom(function = "validate_log_level"))]
    pub level: String,

    #[validate(custom(function = "validate_log_format"))]
    pub format: String,

    pub request_logging: bool,

    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            format: defaults::LOG_FORMAT.to_string(),
            request_logging: defaults::LOG_REQUESTS,
            include_location: defaults::LOG_INCLUDE_LOCATION,
        }
    }
}

fn validate_log_level(value: &str) -> Result<(), ValidationError> {
    match value {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new("invalid_log_level")),
    }
}

fn validate_log_format(value: &str) -> Result<(), ValidationError> {
    match value {
        "json" | "pretty" | "compact" | "text" => Ok(()),
        _ => Err(ValidationError::new("invalid_log_format")),
    }
}

/// Feature flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    pub enable_swagger: bool,
    pub enable_metrics: bool,
    pub enable_health_check: bool,
    pub enable_rate_limit: bool,
    pub enable_cache: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            enable_swagger: defaults::ENABLE_SWAGGER,
            enable_metrics: defaults::ENABLE_METRICS,
            enable_health_check: defaults::ENABLE_HEALTH_CHECK,
            enable_rate_limit: defaults::ENABLE_RATE_LIMIT,
            enable_cache: defaults::ENABLE_CACHE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ApplicationMemoryConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_api_port() {
        let mut config = ApplicationMemoryConfig::default();
        config.api.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_db_type() {
        let mut config = ApplicationMemoryConfig::default();
        config.database.db_type = "oracle".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pool_bounds() {
        let mut config = ApplicationMemoryConfig::default();
        config.database.pool_min = 20;
        config.database.pool_max = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_redis_db() {
        let mut config = ApplicationMemoryConfig::default();
        config.redis.db = 16;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = ApplicationMemoryConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_log_levels() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            let mut config = ApplicationMemoryConfig::default();
            config.logging.level = level.to_string();
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let mut config = ApplicationMemoryConfig::default();
        config.auth.jwt_secret = "0123456789abcdef0123456789abcdef".to_string();
        config.database.password = "hunter2hunter2".to_string();

        let tree = config.redacted();
        assert_eq!(
            tree["auth"]["jwt_secret"],
            format!("{}cdef", "*".repeat(28))
        );
        assert_eq!(tree["database"]["password"], "**********ter2");
        assert_eq!(tree["redis"]["password"], "");
        assert_eq!(tree["api"]["port"], 3000);
    }

    #[test]
    fn test_list_helpers() {
        let mut config = ApplicationMemoryConfig::default();
        config.api.cors_origins = "https://a.example, https://b.example,".to_string();

        assert_eq!(
            config.api.cors_origin_list(),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(config.assets.is_mime_type_allowed("IMAGE/PNG"));
        assert!(!config.assets.is_mime_type_allowed("text/html"));
    }

    #[test]
    fn test_environment_predicates() {
        let mut config = ApplicationMemoryConfig::default();
        assert!(config.is_development());
        config.environment = "production".to_string();
        assert!(config.is_production());
        assert!(!config.is_test());
    }
}

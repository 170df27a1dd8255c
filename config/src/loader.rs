//! # Environment Variable Loader
//!
//! Builds an [`ApplicationMemoryConfig`] from environment variables.
//! Loading never fails: every field has a default, and malformed values
//! fall back to it.

use crate::env::{EnvReader, EnvSource, ProcessEnv};
use crate::schema::{
    ApiConfig, ApplicationMemoryConfig, AssetsConfig, AuthConfig, DatabaseConfig, FeaturesConfig,
    LoggingConfig, MongoDbConfig, RedisConfig, defaults,
};
use chrono::Utc;

/// Load configuration from the process environment.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Reads every variable once and produces a complete snapshot.
///
/// ## Usage
/// ```rust,no_run
/// use config::load_from_env;
///
/// let config = load_from_env();
/// println!("Database host: {}", config.database.host);
/// ```
///
/// ## Environment Variables
/// ### General
/// - `APP_ENV`, then `NODE_ENV`: environment name (default: "development")
///
/// ### API
/// - `API_PORT` (3000), `API_HOST` ("0.0.0.0"), `API_PREFIX` ("api"),
///   `CORS_ORIGINS` ("*"), `API_TIMEOUT_MS` (30000), `API_BODY_LIMIT` (1048576)
///
/// ### Database (`DB_*`)
/// - `DB_TYPE` ("postgresql"), `DB_HOST` ("localhost"), `DB_PORT` (5432),
///   `DB_NAME` ("app"), `DB_USER` ("postgres"), `DB_PASS` (""),
///   `DB_POOL_MIN` (2), `DB_POOL_MAX` (10), `DB_SSL` (false), `DB_DEBUG` (false),
///   `DB_CONNECT_TIMEOUT_MS` (10000), `DB_MIGRATIONS_PATH` ("./migrations")
///
/// ### MongoDB (`MONGODB_*`)
/// - `MONGODB_URI`, `MONGODB_DATABASE`, `MONGODB_MAX_POOL_SIZE`,
///   `MONGODB_CONNECT_TIMEOUT_MS`
///
/// ### Redis (`REDIS_*`)
/// - `REDIS_HOST`, `REDIS_PORT`, `REDIS_PASSWORD`, `REDIS_DB`, `REDIS_TTL`,
///   `REDIS_KEY_PREFIX`
///
/// ### Auth
/// - `JWT_SECRET`, `JWT_EXPIRES_IN` ("1h"), `JWT_REFRESH_EXPIRES_IN` ("7d"),
///   `BCRYPT_ROUNDS` (10)
///
/// ### Assets (`ASSETS_*`)
/// - `ASSETS_STORAGE_PATH`, `ASSETS_MAX_FILE_SIZE`,
///   `ASSETS_ALLOWED_MIME_TYPES`, `ASSETS_CDN_URL`
///
/// ### Logging
/// - `LOG_LEVEL` ("info"), `LOG_FORMAT` ("json"), `LOG_REQUESTS` (true),
///   `LOG_INCLUDE_LOCATION` (false)
///
/// ### Feature Flags
/// - `ENABLE_SWAGGER`, `ENABLE_METRICS`, `ENABLE_HEALTH_CHECK`,
///   `ENABLE_RATE_LIMIT`, `ENABLE_CACHE`
///
/// Booleans accept `true/1/yes/on` and `false/0/no/off`, case-insensitive.
pub fn load_from_env() -> ApplicationMemoryConfig {
    load_from(&ProcessEnv)
}

/// Load configuration from an arbitrary source.
pub fn load_from(source: &dyn EnvSource) -> ApplicationMemoryConfig {
    let env = EnvReader::new(source);
    ApplicationMemoryConfig {
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: env.first_string(&["APP_ENV", "NODE_ENV"], defaults::ENVIRONMENT),
        load_time: Utc::now(),
        api: load_api(&env),
        database: load_database(&env),
        mongodb: load_mongodb(&env),
        redis: load_redis(&env),
        auth: load_auth(&env),
        assets: load_assets(&env),
        logging: load_logging(&env),
        features: load_features(&env),
    }
}

fn load_api(env: &EnvReader<'_>) -> ApiConfig {
    ApiConfig {
        port: env.parse("API_PORT", defaults::API_PORT),
        host: env.string("API_HOST", defaults::API_HOST),
        global_prefix: env.string("API_PREFIX", defaults::API_PREFIX),
        cors_origins: env.string("CORS_ORIGINS", defaults::API_CORS_ORIGINS),
        request_timeout_ms: env.parse("API_TIMEOUT_MS", defaults::API_REQUEST_TIMEOUT_MS),
        body_limit_bytes: env.parse("API_BODY_LIMIT", defaults::API_BODY_LIMIT_BYTES),
    }
}

fn load_database(env: &EnvReader<'_>) -> DatabaseConfig {
    DatabaseConfig {
        db_type: env.string("DB_TYPE", defaults::DB_TYPE),
        host: env.string("DB_HOST", defaults::DB_HOST),
        port: env.parse("DB_PORT", defaults::DB_PORT),
        name: env.string("DB_NAME", defaults::DB_NAME),
        user: env.string("DB_USER", defaults::DB_USER),
        password: env.string("DB_PASS", defaults::DB_PASSWORD),
        pool_min: env.parse("DB_POOL_MIN", defaults::DB_POOL_MIN),
        pool_max: env.parse("DB_POOL_MAX", defaults::DB_POOL_MAX),
        ssl: env.bool("DB_SSL", defaults::DB_SSL),
        debug: env.bool("DB_DEBUG", defaults::DB_DEBUG),
        connect_timeout_ms: env.parse("DB_CONNECT_TIMEOUT_MS", defaults::DB_CONNECT_TIMEOUT_MS),
        migrations_path: env.string("DB_MIGRATIONS_PATH", defaults::DB_MIGRATIONS_PATH),
    }
}

fn load_mongodb(env: &EnvReader<'_>) -> MongoDbConfig {
    MongoDbConfig {
        uri: env.string("MONGODB_URI", defaults::MONGODB_URI),
        database: env.string("MONGODB_DATABASE", defaults::MONGODB_DATABASE),
        max_pool_size: env.parse("MONGODB_MAX_POOL_SIZE", defaults::MONGODB_MAX_POOL_SIZE),
        connect_timeout_ms: env.parse(
            "MONGODB_CONNECT_TIMEOUT_MS",
            defaults::MONGODB_CONNECT_TIMEOUT_MS,
        ),
    }
}

fn load_redis(env: &EnvReader<'_>) -> RedisConfig {
    RedisConfig {
        host: env.string("REDIS_HOST", defaults::REDIS_HOST),
        port: env.parse("REDIS_PORT", defaults::REDIS_PORT),
        password: env.string("REDIS_PASSWORD", defaults::REDIS_PASSWORD),
        db: env.parse("REDIS_DB", defaults::REDIS_DB),
        ttl_seconds: env.parse("REDIS_TTL", defaults::REDIS_TTL_SECONDS),
        key_prefix: env.string("REDIS_KEY_PREFIX", defaults::REDIS_KEY_PREFIX),
    }
}

fn load_auth(env: &EnvReader<'_>) -> AuthConfig {
    AuthConfig {
        jwt_secret: env.string("JWT_SECRET", defaults::JWT_SECRET),
        jwt_expires_in: env.string("JWT_EXPIRES_IN", defaults::JWT_EXPIRES_IN),
        refresh_expires_in: env.string("JWT_REFRESH_EXPIRES_IN", defaults::JWT_REFRESH_EXPIRES_IN),
        bcrypt_rounds: env.parse("BCRYPT_ROUNDS", defaults::BCRYPT_ROUNDS),
    }
}

fn load_assets(env: &EnvReader<'_>) -> AssetsConfig {
    AssetsConfig {
        storage_path: env.string("ASSETS_STORAGE_PATH", defaults::ASSETS_STORAGE_PATH),
        max_file_size: env.parse("ASSETS_MAX_FILE_SIZE", defaults::ASSETS_MAX_FILE_SIZE),
        allowed_mime_types: env.string(
            "ASSETS_ALLOWED_MIME_TYPES",
            defaults::ASSETS_ALLOWED_MIME_TYPES,
        ),
        cdn_url: env.string("ASSETS_CDN_URL", defaults::ASSETS_CDN_URL),
    }
}

fn load_logging(env: &EnvReader<'_>) -> LoggingConfig {
    LoggingConfig {
        level: env.string("LOG_LEVEL", defaults::LOG_LEVEL).to_ascii_lowercase(),
        format: env.string("LOG_FORMAT", defaults::LOG_FORMAT).to_ascii_lowercase(),
        request_logging: env.bool("LOG_REQUESTS", defaults::LOG_REQUESTS),
        include_location: env.bool("LOG_INCLUDE_LOCATION", defaults::LOG_INCLUDE_LOCATION),
    }
}

fn load_features(env: &EnvReader<'_>) -> FeaturesConfig {
    FeaturesConfig {
        enable_swagger: env.bool("ENABLE_SWAGGER", defaults::ENABLE_SWAGGER),
        enable_metrics: env.bool("ENABLE_METRICS", defaults::ENABLE_METRICS),
        enable_health_check: env.bool("ENABLE_HEALTH_CHECK", defaults::ENABLE_HEALTH_CHECK),
        enable_rate_limit: env.bool("ENABLE_RATE_LIMIT", defaults::ENABLE_RATE_LIMIT),
        enable_cache: env.bool("ENABLE_CACHE", defaults::ENABLE_CACHE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;
    use std::env;

    fn source(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_source_yields_defaults() {
        let config = load_from(&HashMap::new());

        assert_eq!(config.environment, "development");

        let api = &config.api;
        assert_eq!(api.port, 3000);
        assert_eq!(api.host, "0.0.0.0");
        assert_eq!(api.global_prefix, "api");
        assert_eq!(api.cors_origins, "*");
        assert_eq!(api.request_timeout_ms, 30_000);
        assert_eq!(api.body_limit_bytes, 1_048_576);

        let database = &config.database;
        assert_eq!(database.db_type, "postgresql");
        assert_eq!(database.host, "localhost");
        assert_eq!(database.port, 5432);
        assert_eq!(database.name, "app");
        assert_eq!(database.user, "postgres");
        assert_eq!(database.password, "");
        assert_eq!(database.pool_min, 2);
        assert_eq!(database.pool_max, 10);
        assert!(!database.ssl);
        assert!(!database.debug);
        assert_eq!(database.connect_timeout_ms, 10_000);
        assert_eq!(database.migrations_path, "./migrations");

        let mongodb = &config.mongodb;
        assert_eq!(mongodb.uri, "mongodb://localhost:27017");
        assert_eq!(mongodb.database, "app");
        assert_eq!(mongodb.max_pool_size, 10);
        assert_eq!(mongodb.connect_timeout_ms, 10_000);

        let redis = &config.redis;
        assert_eq!(redis.host, "localhost");
        assert_eq!(redis.port, 6379);
        assert_eq!(redis.password, "");
        assert_eq!(redis.db, 0);
        assert_eq!(redis.ttl_seconds, 3600);
        assert_eq!(redis.key_prefix, "app:");

        let auth = &config.auth;
        assert_eq!(auth.jwt_secret, "");
        assert_eq!(auth.jwt_expires_in, "1h");
        assert_eq!(auth.refresh_expires_in, "7d");
        assert_eq!(auth.bcrypt_rounds, 10);

        let assets = &config.assets;
        assert_eq!(assets.storage_path, "./uploads");
        assert_eq!(assets.max_file_size, 10_485_760);
        assert_eq!(
            assets.allowed_mime_types,
            "image/jpeg,image/png,image/webp,application/pdf"
        );
        assert_eq!(assets.cdn_url, "");

        let logging = &config.logging;
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
        assert!(logging.request_logging);
        assert!(!logging.include_location);

        let features = &config.features;
        assert!(features.enable_swagger);
        assert!(!features.enable_metrics);
        assert!(features.enable_health_check);
        assert!(features.enable_rate_limit);
        assert!(!features.enable_cache);
    }

    #[test]
    fn test_overrides() {
        let config = load_from(&source(&[
            ("API_PORT", "8080"),
            ("DB_HOST", "db.internal"),
            ("DB_PASS", "secret"),
            ("DB_SSL", "yes"),
            ("REDIS_DB", "3"),
            ("JWT_SECRET", "s3cr3t"),
            ("LOG_LEVEL", "DEBUG"),
            ("ENABLE_SWAGGER", "off"),
        ]));

        assert_eq!(config.api.port, 8080);
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.password, "secret");
        assert!(config.database.ssl);
        assert_eq!(config.redis.db, 3);
        assert_eq!(config.auth.jwt_secret, "s3cr3t");
        assert_eq!(config.logging.level, "debug");
        assert!(!config.features.enable_swagger);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = load_from(&source(&[
            ("API_PORT", "not-a-port"),
            ("DB_PORT", "70000"),
            ("DB_POOL_MAX", ""),
            ("ENABLE_CACHE", "sometimes"),
        ]));

        assert_eq!(config.api.port, defaults::API_PORT);
        assert_eq!(config.database.port, defaults::DB_PORT);
        assert_eq!(config.database.pool_max, defaults::DB_POOL_MAX);
        assert_eq!(config.features.enable_cache, defaults::ENABLE_CACHE);
    }

    #[test]
    fn test_app_env_wins_over_node_env() {
        let config = load_from(&source(&[("APP_ENV", "staging"), ("NODE_ENV", "test")]));
        assert_eq!(config.environment, "staging");

        let config = load_from(&source(&[("NODE_ENV", "test")]));
        assert_eq!(config.environment, "test");
    }

    #[test]
    #[serial]
    fn test_load_from_process_env() {
        unsafe {
            env::set_var("API_PORT", "4100");
            env::set_var("REDIS_HOST", "cache.internal");
            env::remove_var("DB_HOST");
        }

        let config = load_from_env();
        assert_eq!(config.api.port, 4100);
        assert_eq!(config.redis.host, "cache.internal");
        assert_eq!(config.database.host, defaults::DB_HOST);

        unsafe {
            env::remove_var("API_PORT");
            env::remove_var("REDIS_HOST");
        }
    }
}

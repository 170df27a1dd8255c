//! # Connection Options
//!
//! Driver selection and connection parameters derived from the
//! configuration snapshot.

use crate::error::DatabaseError;
use config::{ApplicationMemoryConfig, DatabaseConfig, MongoDbConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    Postgresql,
    Mongodb,
}

impl DatabaseDriver {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Postgresql => "postgresql",
            Self::Mongodb => "mongodb",
        }
    }
}

impl fmt::Display for DatabaseDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseDriver {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(Self::Postgresql),
            "mongodb" | "mongo" => Ok(Self::Mongodb),
            other => Err(DatabaseError::config(format!("unsupported database type '{other}'"))
                .with_context("db_type", other)),
        }
    }
}

/// Everything needed to open a connection.
///
/// ## Fields
/// - `driver`: which backend to connect to
/// - `host` / `port` / `database` / `user` / `password`: PostgreSQL target
/// - `mongodb_uri`: MongoDB target, used as-is
/// - `pool_min` / `pool_max`: pool bounds for either driver
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionOptions {
    pub driver: DatabaseDriver,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub ssl: bool,
    pub debug: bool,
    pub pool_min: u32,
    pub pool_max: u32,
    pub connect_timeout: Duration,
    pub migrations_path: PathBuf,
    pub mongodb_uri: String,
    pub mongodb_database: String,
}

impl ConnectionOptions {
    pub fn from_config(
        database: &DatabaseConfig,
        mongodb: &MongoDbConfig,
    ) -> Result<Self, DatabaseError> {
        let driver: DatabaseDriver = database.db_type.parse()?;
        let (pool_max, connect_timeout_ms) = match driver {
            DatabaseDriver::Postgresql => (database.pool_max, database.connect_timeout_ms),
            DatabaseDriver::Mongodb => (mongodb.max_pool_size, mongodb.connect_timeout_ms),
        };

        if pool_max == 0 {
            return Err(DatabaseError::config("pool size must be at least 1")
                .with_context("driver", driver.as_str()));
        }

        Ok(Self {
            driver,
            host: database.host.clone(),
            port: database.port,
            database: database.name.clone(),
            user: database.user.clone(),
            password: database.password.clone(),
            ssl: database.ssl,
            debug: database.debug,
            pool_min: database.pool_min.min(pool_max),
            pool_max,
            connect_timeout: Duration::from_millis(connect_timeout_ms),
            migrations_path: PathBuf::from(&database.migrations_path),
            mongodb_uri: mongodb.uri.clone(),
            mongodb_database: mongodb.database.clone(),
        })
    }

    pub fn from_snapshot(config: &ApplicationMemoryConfig) -> Result<Self, DatabaseError> {
        Self::from_config(&config.database, &config.mongodb)
    }

    /// Connection URL for the selected driver.
    pub fn url(&self) -> Result<String, DatabaseError> {
        match self.driver {
            DatabaseDriver::Postgresql => self.postgres_url(Some(&self.password)),
            DatabaseDriver::Mongodb => Ok(self.mongodb_uri.clone()),
        }
    }

    /// [`url`](Self::url) with the password masked, for logs.
    pub fn redacted_url(&self) -> String {
        let url = match self.driver {
            DatabaseDriver::Postgresql => {
                let masked = (!self.password.is_empty()).then_some("****");
                self.postgres_url(masked)
            }
            DatabaseDriver::Mongodb => Url::parse(&self.mongodb_uri)
                .map(|mut url| {
                    if url.password().is_some() {
                        let _ = url.set_password(Some("****"));
                    }
                    url.to_string()
                })
                .map_err(|e| DatabaseError::config(e.to_string())),
        };
        url.unwrap_or_else(|_| format!("{}://<invalid>", self.driver))
    }

    fn postgres_url(&self, password: Option<&str>) -> Result<String, DatabaseError> {
        let invalid = |what: &str| {
            DatabaseError::config(format!("invalid {what} in connection options"))
                .with_context("host", self.host.clone())
        };

        let mut url = Url::parse("postgres://localhost")
            .map_err(|e| DatabaseError::config(e.to_string()))?;
        url.set_host(Some(&self.host)).map_err(|_| invalid("host"))?;
        url.set_port(Some(self.port)).map_err(|()| invalid("port"))?;
        url.set_username(&self.user).map_err(|()| invalid("user"))?;
        url.set_password(password.filter(|p| !p.is_empty()))
            .map_err(|()| invalid("password"))?;
        url.set_path(&self.database);
        url.query_pairs_mut()
            .append_pair("sslmode", if self.ssl { "require" } else { "disable" });
        Ok(url.to_string())
    }
}

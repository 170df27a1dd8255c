//! # Database Connections
//!
//! A [`DatabaseConnection`] is a pooled handle to one backend that can be
//! pinged, rebuilt and closed. PostgreSQL goes through `sqlx`, MongoDB
//! through the official driver.

use crate::error::DatabaseError;
use crate::options::{ConnectionOptions, DatabaseDriver};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{Client, bson::doc, options::ClientOptions};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::sync::Arc;
use std::time::Instant;

/// Result of a connection health probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseHealth {
    pub healthy: bool,
    pub driver: String,
    pub latency_ms: Option<u64>,
    pub message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl DatabaseHealth {
    pub fn healthy(driver: &str) -> Self {
        Self {
            healthy: true,
            driver: driver.to_string(),
            latency_ms: None,
            message: None,
            checked_at: Utc::now(),
        }
    }

    pub fn unhealthy(driver: &str, message: impl Into<String>) -> Self {
        Self {
            healthy: false,
            driver: driver.to_string(),
            latency_ms: None,
            message: Some(message.into()),
            checked_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_latency(mut self, ms: u64) -> Self {
        self.latency_ms = Some(ms);
        self
    }
}

/// A pooled connection to one database backend.
#[async_trait]
pub trait DatabaseConnection: Send + Sync {
    fn driver(&self) -> DatabaseDriver;

    /// Round-trip a trivial command.
    async fn ping(&self) -> Result<(), DatabaseError>;

    /// Drop the current pool and build a new one.
    async fn reconnect(&self) -> Result<(), DatabaseError>;

    async fn close(&self);

    async fn health(&self) -> DatabaseHealth {
        let driver = self.driver();
        let start = Instant::now();
        match self.ping().await {
            Ok(()) => DatabaseHealth::healthy(driver.as_str())
                .with_latency(start.elapsed().as_millis() as u64),
            Err(e) => DatabaseHealth::unhealthy(driver.as_str(), e.to_string()),
        }
    }
}

/// Open a connection for the configured driver.
pub async fn connect(
    options: &ConnectionOptions,
) -> Result<Arc<dyn DatabaseConnection>, DatabaseError> {
    let connection: Arc<dyn DatabaseConnection> = match options.driver {
        DatabaseDriver::Postgresql => Arc::new(PostgresConnection::connect(options.clone()).await?),
        DatabaseDriver::Mongodb => Arc::new(MongoConnection::connect(options.clone()).await?),
    };
    Ok(connection)
}

pub struct PostgresConnection {
    options: ConnectionOptions,
    pool: RwLock<PgPool>,
}

impl PostgresConnection {
    /// Connect and verify the pool can hand out a connection.
    pub async fn connect(options: ConnectionOptions) -> Result<Self, DatabaseError> {
        let pool = Self::pool_options(&options)
            .connect(&options.url()?)
            .await
            .map_err(|e| Self::connection_error(&options, &e))?;
        Ok(Self {
            options,
            pool: RwLock::new(pool),
        })
    }

    /// Build the pool without connecting; the first query opens a connection.
    pub fn connect_lazy(options: ConnectionOptions) -> Result<Self, DatabaseError> {
        let pool = Self::pool_options(&options)
            .connect_lazy(&options.url()?)
            .map_err(|e| Self::connection_error(&options, &e))?;
        Ok(Self {
            options,
            pool: RwLock::new(pool),
        })
    }

    pub fn pool(&self) -> PgPool {
        self.pool.read().clone()
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    fn pool_options(options: &ConnectionOptions) -> PgPoolOptions {
        PgPoolOptions::new()
            .min_connections(options.pool_min)
            .max_connections(options.pool_max)
            .acquire_timeout(options.connect_timeout)
    }

    fn connection_error(options: &ConnectionOptions, err: &sqlx::Error) -> DatabaseError {
        DatabaseError::connection(DatabaseDriver::Postgresql.as_str(), err.to_string())
            .with_context("host", options.host.clone())
            .with_context("port", options.port)
            .with_context("database", options.database.clone())
    }
}

#[async_trait]
impl DatabaseConnection for PostgresConnection {
    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Postgresql
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        let pool = self.pool();
        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| Self::connection_error(&self.options, &e))?;
        Ok(())
    }

    async fn reconnect(&self) -> Result<(), DatabaseError> {
        let fresh = Self::pool_options(&self.options)
            .connect(&self.options.url()?)
            .await
            .map_err(|e| Self::connection_error(&self.options, &e))?;
        let stale = std::mem::replace(&mut *self.pool.write(), fresh);
        stale.close().await;
        Ok(())
    }

    async fn close(&self) {
        let pool = self.pool();
        pool.close().await;
    }
}

pub struct MongoConnection {
    options: ConnectionOptions,
    client: RwLock<Client>,
}

impl MongoConnection {
    /// Connect and ping the configured database.
    pub async fn connect(options: ConnectionOptions) -> Result<Self, DatabaseError> {
        let client = Self::build_client(&options).await?;
        let connection = Self {
            options,
            client: RwLock::new(client),
        };
        connection.ping().await?;
        Ok(connection)
    }

    /// Build the client without contacting the server.
    pub async fn connect_lazy(options: ConnectionOptions) -> Result<Self, DatabaseError> {
        let client = Self::build_client(&options).await?;
        Ok(Self {
            options,
            client: RwLock::new(client),
        })
    }

    pub fn client(&self) -> Client {
        self.client.read().clone()
    }

    pub fn database(&self) -> mongodb::Database {
        self.client().database(&self.options.mongodb_database)
    }

    async fn build_client(options: &ConnectionOptions) -> Result<Client, DatabaseError> {
        let mut client_options = ClientOptions::parse(&options.mongodb_uri)
            .await
            .map_err(|e| Self::connection_error(options, &e))?;
        client_options.max_pool_size = Some(options.pool_max);
        client_options.min_pool_size = Some(options.pool_min);
        client_options.connect_timeout = Some(options.connect_timeout);
        client_options.server_selection_timeout = Some(options.connect_timeout);

        Client::with_options(client_options).map_err(|e| Self::connection_error(options, &e))
    }

    fn connection_error(options: &ConnectionOptions, err: &mongodb::error::Error) -> DatabaseError {
        DatabaseError::connection(DatabaseDriver::Mongodb.as_str(), err.to_string())
            .with_context("database", options.mongodb_database.clone())
    }
}

#[async_trait]
impl DatabaseConnection for MongoConnection {
    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Mongodb
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        self.database()
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| Self::connection_error(&self.options, &e))?;
        Ok(())
    }

    async fn reconnect(&self) -> Result<(), DatabaseError> {
        let fresh = Self::build_client(&self.options).await?;
        fresh
            .database(&self.options.mongodb_database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| Self::connection_error(&self.options, &e))?;
        let stale = std::mem::replace(&mut *self.client.write(), fresh);
        stale.shutdown().await;
        Ok(())
    }

    async fn close(&self) {
        self.client().shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{DatabaseConfig, MongoDbConfig};
    use std::time::Duration;

    fn unreachable_postgres() -> ConnectionOptions {
        let mut database = DatabaseConfig::default();
        database.host = "127.0.0.1".to_string();
        database.port = 1;
        database.pool_min = 0;
        let mut options =
            ConnectionOptions::from_config(&database, &MongoDbConfig::default()).unwrap();
        options.connect_timeout = Duration::from_millis(500);
        options
    }

    #[test]
    fn test_health_constructors() {
        let health = DatabaseHealth::healthy("postgresql").with_latency(3);
        assert!(health.healthy);
        assert_eq!(health.latency_ms, Some(3));

        let health = DatabaseHealth::unhealthy("mongodb", "down");
        assert!(!health.healthy);
        assert_eq!(health.message.as_deref(), Some("down"));
    }

    #[tokio::test]
    async fn test_lazy_postgres_reports_unhealthy() {
        let connection = PostgresConnection::connect_lazy(unreachable_postgres()).unwrap();
        assert_eq!(connection.driver(), DatabaseDriver::Postgresql);

        let health = connection.health().await;
        assert!(!health.healthy);
        assert_eq!(health.driver, "postgresql");
        assert!(health.message.is_some());
    }

    #[tokio::test]
    async fn test_postgres_connect_failure_carries_context() {
        let err = PostgresConnection::connect(unreachable_postgres())
            .await
            .err()
            .unwrap();

        assert_eq!(err.error_code(), "DB_CONNECTION_FAILED");
        assert_eq!(err.context()["host"], "127.0.0.1");
        assert_eq!(err.context()["port"], 1);
    }

    #[tokio::test]
    async fn test_invalid_mongodb_uri_rejected() {
        let mut database = DatabaseConfig::default();
        database.db_type = "mongodb".to_string();
        let mut mongodb = MongoDbConfig::default();
        mongodb.uri = "not-a-uri".to_string();
        let options = ConnectionOptions::from_config(&database, &mongodb).unwrap();

        let err = MongoConnection::connect_lazy(options).await.err().unwrap();
        assert_eq!(err.error_code(), "DB_CONNECTION_FAILED");
    }
}

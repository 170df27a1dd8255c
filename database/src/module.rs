//! # Database Module
//!
//! Connects with the configured driver, optionally applies migrations and
//! starts the health monitor.

use crate::connection::{self, DatabaseConnection, DatabaseHealth, PostgresConnection};
use crate::error::DatabaseError;
use crate::manager::{ConnectionManager, DEFAULT_HEALTH_CHECK_INTERVAL};
use crate::migration::{Migrator, PostgresMigrator, UnsupportedMigrator};
use crate::options::{ConnectionOptions, DatabaseDriver};
use config::ApplicationMemoryConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Options for [`DatabaseModule::for_root`].
///
/// ## Fields
/// - `connection`: driver and target
/// - `health_check_interval`: period of the background health check
/// - `run_migrations`: apply pending PostgreSQL migrations on startup
#[derive(Debug, Clone)]
pub struct DatabaseModuleOptions {
    pub connection: ConnectionOptions,
    pub health_check_interval: Duration,
    pub run_migrations: bool,
}

impl DatabaseModuleOptions {
    pub fn new(connection: ConnectionOptions) -> Self {
        Self {
            connection,
            health_check_interval: DEFAULT_HEALTH_CHECK_INTERVAL,
            run_migrations: false,
        }
    }

    pub fn from_config(config: &ApplicationMemoryConfig) -> Result<Self, DatabaseError> {
        Ok(Self::new(ConnectionOptions::from_snapshot(config)?))
    }

    #[must_use]
    pub fn with_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    #[must_use]
    pub fn with_health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }
}

/// A connected database with its monitor and migrator.
pub struct DatabaseModule {
    manager: Arc<ConnectionManager>,
    migrator: Arc<dyn Migrator>,
    driver: DatabaseDriver,
}

impl DatabaseModule {
    pub async fn for_root(options: DatabaseModuleOptions) -> Result<Self, DatabaseError> {
        let driver = options.connection.driver;
        info!(
            driver = %driver,
            url = %options.connection.redacted_url(),
            "Connecting to database"
        );

        let (connection, migrator): (Arc<dyn DatabaseConnection>, Arc<dyn Migrator>) = match driver {
            DatabaseDriver::Postgresql => {
                let postgres = PostgresConnection::connect(options.connection.clone()).await?;
                let migrator = PostgresMigrator::new(
                    postgres.pool(),
                    options.connection.migrations_path.clone(),
                );
                (Arc::new(postgres), Arc::new(migrator))
            }
            DatabaseDriver::Mongodb => (
                connection::connect(&options.connection).await?,
                Arc::new(UnsupportedMigrator::new(driver)),
            ),
        };

        let module = Self::from_parts(connection, migrator, options.health_check_interval);
        if options.run_migrations {
            module.migrator.up().await?;
        }
        module.manager.start();
        Ok(module)
    }

    pub async fn for_root_async<F>(options: F) -> Result<Self, DatabaseError>
    where
        F: Future<Output = Result<DatabaseModuleOptions, DatabaseError>>,
    {
        Self::for_root(options.await?).await
    }

    /// Assemble from an existing connection without starting the monitor.
    pub fn from_parts(
        connection: Arc<dyn DatabaseConnection>,
        migrator: Arc<dyn Migrator>,
        health_check_interval: Duration,
    ) -> Self {
        let driver = connection.driver();
        Self {
            manager: Arc::new(ConnectionManager::new(connection, health_check_interval)),
            migrator,
            driver,
        }
    }

    pub fn driver(&self) -> DatabaseDriver {
        self.driver
    }

    pub fn connection(&self) -> Arc<dyn DatabaseConnection> {
        self.manager.connection()
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    pub fn migrator(&self) -> Arc<dyn Migrator> {
        Arc::clone(&self.migrator)
    }

    pub async fn health(&self) -> DatabaseHealth {
        self.manager.health().await
    }

    pub async fn close(&self) {
        self.manager.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{DatabaseConfig, MongoDbConfig};

    #[tokio::test]
    async fn test_for_root_surfaces_connection_error() {
        let mut database = DatabaseConfig::default();
        database.host = "127.0.0.1".to_string();
        database.port = 1;
        database.pool_min = 0;
        let mut connection =
            ConnectionOptions::from_config(&database, &MongoDbConfig::default()).unwrap();
        connection.connect_timeout = Duration::from_millis(500);

        let result = DatabaseModule::for_root_async(async move {
            Ok(DatabaseModuleOptions::new(connection))
        })
        .await;

        match result {
            Err(DatabaseError::Connection { driver, .. }) => assert_eq!(driver, "postgresql"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected connection failure"),
        }
    }

    #[tokio::test]
    async fn test_from_parts_uses_connection_driver() {
        let mut database = DatabaseConfig::default();
        database.port = 1;
        database.pool_min = 0;
        let options = ConnectionOptions::from_config(&database, &MongoDbConfig::default()).unwrap();
        let postgres = PostgresConnection::connect_lazy(options).unwrap();
        let migrator = Arc::new(PostgresMigrator::new(postgres.pool(), "./migrations"));

        let module = DatabaseModule::from_parts(Arc::new(postgres), migrator, Duration::from_secs(30));
        assert_eq!(module.driver(), DatabaseDriver::Postgresql);
        assert!(!module.manager().is_running());
    }

    #[test]
    fn test_options_from_config() {
        let config = ApplicationMemoryConfig::default();
        let options = DatabaseModuleOptions::from_config(&config)
            .unwrap()
            .with_migrations(true)
            .with_health_check_interval(Duration::from_secs(5));

        assert_eq!(options.connection.driver, DatabaseDriver::Postgresql);
        assert!(options.run_migrations);
        assert_eq!(options.health_check_interval, Duration::from_secs(5));
    }
}

//! # Database
//!
//! Connection lifecycle for the platform services: driver selection from
//! the configuration snapshot, pooled connections for PostgreSQL and
//! MongoDB, a periodic health check with a single reconnect attempt, and
//! migration passthrough.
//!
//! Entities and query building are left to the application.

pub mod connection;
pub mod error;
pub mod manager;
pub mod migration;
pub mod module;
pub mod options;

pub use connection::{
    DatabaseConnection, DatabaseHealth, MongoConnection, PostgresConnection, connect,
};
pub use error::DatabaseError;
pub use manager::{ConnectionManager, DEFAULT_HEALTH_CHECK_INTERVAL, ManagerStats};
pub use migration::{MigrationInfo, Migrator, PostgresMigrator, UnsupportedMigrator};
pub use module::{DatabaseModule, DatabaseModuleOptions};
pub use options::{ConnectionOptions, DatabaseDriver};

//! # Schema Migrations
//!
//! PostgreSQL migrations are plain `sqlx` migration files
//! (`<version>_<description>.up.sql` / `.down.sql`) read from the configured
//! directory. MongoDB has no migrator.

use crate::error::DatabaseError;
use crate::options::DatabaseDriver;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use sqlx::migrate::Migrator as SqlxMigrator;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::info;

const MIGRATIONS_TABLE: &str = "_sqlx_migrations";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationInfo {
    pub version: i64,
    pub description: String,
}

#[async_trait]
pub trait Migrator: Send + Sync {
    /// Apply every pending migration, returning what was applied.
    async fn up(&self) -> Result<Vec<MigrationInfo>, DatabaseError>;

    /// Revert the most recently applied migration, returning it.
    async fn down(&self) -> Result<Option<MigrationInfo>, DatabaseError>;

    /// Migrations present on disk but not yet applied.
    async fn pending(&self) -> Result<Vec<MigrationInfo>, DatabaseError>;
}

pub struct PostgresMigrator {
    pool: PgPool,
    path: PathBuf,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool, path: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            path: path.into(),
        }
    }

    async fn source(&self) -> Result<SqlxMigrator, DatabaseError> {
        SqlxMigrator::new(self.path.as_path()).await.map_err(|e| {
            DatabaseError::migration(e.to_string())
                .with_context("path", self.path.display().to_string())
        })
    }

    async fn applied_versions(&self) -> Result<BTreeSet<i64>, DatabaseError> {
        let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
            .bind(MIGRATIONS_TABLE)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::migration(e.to_string()))?;
        if !exists {
            return Ok(BTreeSet::new());
        }

        let versions: Vec<i64> = sqlx::query_scalar(
            "SELECT version FROM _sqlx_migrations WHERE success = true ORDER BY version",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::migration(e.to_string()))?;
        Ok(versions.into_iter().collect())
    }

    fn describe(migrator: &SqlxMigrator, versions: impl Fn(i64) -> bool) -> Vec<MigrationInfo> {
        migrator
            .iter()
            .filter(|m| !m.migration_type.is_down_migration() && versions(m.version))
            .map(|m| MigrationInfo {
                version: m.version,
                description: m.description.to_string(),
            })
            .collect()
    }
}

#[async_trait]
impl Migrator for PostgresMigrator {
    async fn up(&self) -> Result<Vec<MigrationInfo>, DatabaseError> {
        let pending = self.pending().await?;
        if pending.is_empty() {
            return Ok(pending);
        }

        let migrator = self.source().await?;
        migrator
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::migration(e.to_string()))?;

        info!(count = pending.len(), "Applied database migrations");
        Ok(pending)
    }

    async fn down(&self) -> Result<Option<MigrationInfo>, DatabaseError> {
        let applied = self.applied_versions().await?;
        let Some(&latest) = applied.last() else {
            return Ok(None);
        };
        let target = applied.range(..latest).next_back().copied().unwrap_or(0);

        let migrator = self.source().await?;
        let reverted = Self::describe(&migrator, |v| v == latest).into_iter().next();
        migrator.undo(&self.pool, target).await.map_err(|e| {
            DatabaseError::migration(e.to_string()).with_context("version", latest)
        })?;

        info!(version = latest, "Reverted database migration");
        Ok(reverted)
    }

    async fn pending(&self) -> Result<Vec<MigrationInfo>, DatabaseError> {
        let migrator = self.source().await?;
        let applied = self.applied_versions().await?;
        Ok(Self::describe(&migrator, |v| !applied.contains(&v)))
    }
}

/// Migrator for drivers without migration support.
pub struct UnsupportedMigrator {
    driver: DatabaseDriver,
}

impl UnsupportedMigrator {
    pub fn new(driver: DatabaseDriver) -> Self {
        Self { driver }
    }

    fn error(&self) -> DatabaseError {
        DatabaseError::migration(format!("migrations are not supported for {}", self.driver))
            .with_context("driver", self.driver.as_str())
    }
}

#[async_trait]
impl Migrator for UnsupportedMigrator {
    async fn up(&self) -> Result<Vec<MigrationInfo>, DatabaseError> {
        Err(self.error())
    }

    async fn down(&self) -> Result<Option<MigrationInfo>, DatabaseError> {
        Err(self.error())
    }

    async fn pending(&self) -> Result<Vec<MigrationInfo>, DatabaseError> {
        Err(self.error())
    }
}

//! # Connection Manager
//!
//! Owns the live connection and checks it on a fixed interval. When a
//! check fails the manager tries exactly one reconnect; whatever the
//! outcome, it waits for the next tick. There is no backoff.

use crate::connection::{DatabaseConnection, DatabaseHealth};
use logging::Logger;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManagerStats {
    pub checks: u64,
    pub failures: u64,
    pub reconnect_attempts: u64,
    pub reconnect_successes: u64,
}

pub struct ConnectionManager {
    connection: Arc<dyn DatabaseConnection>,
    interval: Duration,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    last_health: RwLock<Option<DatabaseHealth>>,
    stats: RwLock<ManagerStats>,
    logger: Logger,
}

impl ConnectionManager {
    pub fn new(connection: Arc<dyn DatabaseConnection>, interval: Duration) -> Self {
        let logger = Logger::new("ConnectionManager").child("driver", connection.driver());
        Self {
            connection,
            interval,
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
            last_health: RwLock::new(None),
            stats: RwLock::new(ManagerStats::default()),
            logger,
        }
    }

    pub fn connection(&self) -> Arc<dyn DatabaseConnection> {
        Arc::clone(&self.connection)
    }

    /// Start the periodic health check. Calling it twice has no effect.
    pub fn start(self: &Arc<Self>) {
        let mut task = self.task.lock();
        if task.is_some() {
            return;
        }

        // The loop holds a weak handle so dropping the manager ends it.
        let manager = Arc::downgrade(self);
        let cancel = self.cancel.clone();
        let period = self.interval;
        *task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // First tick fires immediately.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let Some(manager) = manager.upgrade() else { break };
                        manager.check_once().await;
                    }
                    _ = cancel.cancelled() => break,
                }
            }
        }));
        self.logger.debug(format!(
            "Health monitoring started every {}s",
            self.interval.as_secs()
        ));
    }

    /// Probe the connection, reconnecting once if the probe fails.
    pub async fn check_once(&self) -> DatabaseHealth {
        let mut health = self.connection.health().await;
        self.stats.write().checks += 1;

        if !health.healthy {
            self.stats.write().failures += 1;
            self.logger.warn(format!(
                "Database health check failed: {}",
                health.message.as_deref().unwrap_or("unknown error")
            ));

            self.stats.write().reconnect_attempts += 1;
            match self.connection.reconnect().await {
                Ok(()) => {
                    self.stats.write().reconnect_successes += 1;
                    self.logger.info("Database reconnected");
                    health = self.connection.health().await;
                }
                Err(e) => {
                    self.logger.error_with("Database reconnect failed", &e);
                }
            }
        }

        *self.last_health.write() = Some(health.clone());
        health
    }

    /// Last recorded health, or a fresh probe when none exists yet.
    pub async fn health(&self) -> DatabaseHealth {
        let last = self.last_health.read().clone();
        match last {
            Some(health) => health,
            None => {
                let health = self.connection.health().await;
                *self.last_health.write() = Some(health.clone());
                health
            }
        }
    }

    pub fn last_health(&self) -> Option<DatabaseHealth> {
        self.last_health.read().clone()
    }

    pub fn stats(&self) -> ManagerStats {
        self.stats.read().clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop monitoring and close the connection.
    pub async fn close(&self) {
        self.cancel.cancel();
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                self.logger.warn(format!("Health monitor ended abnormally: {e}"));
            }
        }
        self.connection.close().await;
        self.logger.info("Database connection closed");
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

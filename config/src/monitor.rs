//! # Configuration Monitor
//!
//! Periodically runs the health checker, remembers the last report and
//! fingerprints the snapshot so reloads show up in the logs.

use crate::health::{ConfigHealthChecker, ConfigHealthReport};
use crate::service::MemoryConfigService;
use logging::Logger;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorStats {
    pub checks_run: u64,
    pub changes_detected: u64,
    pub last_report: Option<ConfigHealthReport>,
    pub fingerprint: Option<String>,
}

pub struct ConfigMonitor {
    service: Arc<MemoryConfigService>,
    checker: ConfigHealthChecker,
    interval: Duration,
    stats: RwLock<MonitorStats>,
    logger: Logger,
}

impl ConfigMonitor {
    pub fn new(service: Arc<MemoryConfigService>, interval: Duration) -> Self {
        Self {
            checker: ConfigHealthChecker::new(Arc::clone(&service)),
            service,
            interval,
            stats: RwLock::new(MonitorStats::default()),
            logger: Logger::new("ConfigMonitor"),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one check cycle and record its outcome.
    pub fn run_once(&self) -> ConfigHealthReport {
        let report = self.checker.check();
        let fingerprint = self.fingerprint();

        let mut stats = self.stats.write();
        stats.checks_run += 1;

        let changed = match (&stats.fingerprint, &fingerprint) {
            (Some(previous), Some(current)) => previous != current,
            _ => false,
        };
        if changed {
            stats.changes_detected += 1;
            let redacted = self
                .service
                .snapshot()
                .map(|s| s.redacted().to_string())
                .unwrap_or_default();
            self.logger
                .child("fingerprint", fingerprint.as_deref().unwrap_or_default())
                .info(format!("Configuration changed: {redacted}"));
        }

        let was_healthy = stats.last_report.as_ref().is_none_or(|r| r.is_healthy);
        if !report.is_healthy && was_healthy {
            self.logger.warn(format!(
                "Configuration health check failed: {}",
                report.issues.join("; ")
            ));
        } else if report.is_healthy && !was_healthy {
            self.logger.info("Configuration health restored");
        }

        if fingerprint.is_some() {
            stats.fingerprint = fingerprint;
        }
        stats.last_report = Some(report.clone());
        report
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats.read().clone()
    }

    pub fn last_report(&self) -> Option<ConfigHealthReport> {
        self.stats.read().last_report.clone()
    }

    /// SHA-256 of the snapshot contents, excluding `load_time`.
    pub fn fingerprint(&self) -> Option<String> {
        let snapshot = self.service.snapshot().ok()?;
        let tree = serde_json::to_value(snapshot.as_ref()).ok()?;
        let stable = utils::omit(&tree, &["load_time"]);
        Some(utils::compute_content_hash(&stable.to_string()))
    }

    /// Run checks every `interval` until `cancel` fires.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.run_once();
                    }
                    _ = cancel.cancelled() => {
                        self.logger.debug("Configuration monitor stopped");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn monitored(pairs: &[(&str, &str)]) -> (Arc<ConfigMonitor>, Arc<MemoryConfigService>, Arc<RwLock<HashMap<String, String>>>) {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let env = Arc::new(RwLock::new(env));
        let service = Arc::new(MemoryConfigService::with_source(env.clone()));
        let monitor = Arc::new(ConfigMonitor::new(
            Arc::clone(&service),
            Duration::from_millis(10),
        ));
        (monitor, service, env)
    }

    #[test]
    fn test_fingerprint_ignores_load_time() {
        let (monitor, service, _) = monitored(&[]);
        assert!(monitor.fingerprint().is_none());

        service.load();
        let first = monitor.fingerprint().unwrap();
        service.reload();
        assert_eq!(monitor.fingerprint().unwrap(), first);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_detects_changes_across_reload() {
        let (monitor, service, env) = monitored(&[("API_PORT", "3000")]);
        service.load();

        monitor.run_once();
        monitor.run_once();
        assert_eq!(monitor.stats().changes_detected, 0);

        env.write().insert("API_PORT".to_string(), "3100".to_string());
        service.reload();
        monitor.run_once();

        let stats = monitor.stats();
        assert_eq!(stats.checks_run, 3);
        assert_eq!(stats.changes_detected, 1);
    }

    #[test]
    fn test_keeps_last_report() {
        let (monitor, service, _) = monitored(&[]);
        assert!(monitor.last_report().is_none());

        let report = monitor.run_once();
        assert!(!report.is_healthy);

        service.load();
        monitor.run_once();
        let last = monitor.last_report().unwrap();
        assert!(last.issues.iter().all(|i| i.starts_with("auth.jwt_secret")));
    }

    #[tokio::test]
    async fn test_spawned_monitor_stops_on_cancel() {
        let (monitor, service, _) = monitored(&[]);
        service.load();

        let cancel = CancellationToken::new();
        let handle = Arc::clone(&monitor).spawn(cancel.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert!(monitor.stats().checks_run >= 1);
    }
}

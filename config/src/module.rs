//! # Config Module
//!
//! One-call setup: build the service, load the snapshot, validate it and
//! optionally start the monitor.

use crate::env::EnvSource;
use crate::error::ConfigError;
use crate::health::ConfigHealthChecker;
use crate::monitor::ConfigMonitor;
use crate::service::MemoryConfigService;
use crate::validation::ValidationReport;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Options for [`ConfigModule::for_root`].
///
/// ## Fields
/// - `source`: where variables come from, the process environment when `None`
/// - `validate`: run validation right after loading
/// - `fail_on_invalid`: turn an invalid report into [`ConfigError::Validation`]
/// - `monitor_interval`: start a [`ConfigMonitor`] with this period
/// - `defer_report`: skip the load-time log lines; the caller emits them
///   with [`ConfigModule::report`] once a subscriber is installed
#[derive(Clone, Default)]
pub struct ConfigModuleOptions {
    pub source: Option<Arc<dyn EnvSource>>,
    pub validate: bool,
    pub fail_on_invalid: bool,
    pub monitor_interval: Option<Duration>,
    pub defer_report: bool,
}

impl ConfigModuleOptions {
    pub fn new() -> Self {
        Self {
            validate: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn EnvSource>) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn fail_on_invalid(mut self, fail: bool) -> Self {
        self.validate = self.validate || fail;
        self.fail_on_invalid = fail;
        self
    }

    #[must_use]
    pub fn with_monitor(mut self, interval: Duration) -> Self {
        self.monitor_interval = Some(interval);
        self
    }

    #[must_use]
    pub fn defer_report(mut self, defer: bool) -> Self {
        self.defer_report = defer;
        self
    }
}

/// The loaded configuration stack.
pub struct ConfigModule {
    service: Arc<MemoryConfigService>,
    checker: ConfigHealthChecker,
    monitor: Option<Arc<ConfigMonitor>>,
    monitor_task: Option<JoinHandle<()>>,
    cancel: CancellationToken,
    validation: Option<ValidationReport>,
}

impl ConfigModule {
    /// Build, load and validate.
    ///
    /// The monitor task is only started when called inside a Tokio runtime.
    pub fn for_root(options: ConfigModuleOptions) -> Result<Self, ConfigError> {
        let service = Arc::new(match &options.source {
            Some(source) => MemoryConfigService::with_source(Arc::clone(source)),
            None => MemoryConfigService::new(),
        });
        let snapshot = service.load();

        let validation = if options.validate {
            let report = crate::validation::validate(&snapshot);
            if !report.is_valid && options.fail_on_invalid {
                return Err(ConfigError::Validation {
                    errors: report.errors,
                });
            }
            Some(report)
        } else {
            None
        };

        let cancel = CancellationToken::new();
        let monitor = options
            .monitor_interval
            .map(|interval| Arc::new(ConfigMonitor::new(Arc::clone(&service), interval)));
        let monitor_task = match (&monitor, tokio::runtime::Handle::try_current()) {
            (Some(monitor), Ok(_)) => Some(Arc::clone(monitor).spawn(cancel.clone())),
            (Some(_), Err(_)) => {
                warn!("No Tokio runtime available, configuration monitor not started");
                None
            }
            (None, _) => None,
        };

        let module = Self {
            checker: ConfigHealthChecker::new(Arc::clone(&service)),
            service,
            monitor,
            monitor_task,
            cancel,
            validation,
        };
        if !options.defer_report {
            module.report();
        }
        Ok(module)
    }

    /// Log the load-time validation warnings and the loaded environment.
    pub fn report(&self) {
        if let Some(report) = &self.validation {
            for error in &report.errors {
                warn!(error = %error, "Invalid configuration value");
            }
        }
        if let Ok(snapshot) = self.service.snapshot() {
            info!(
                environment = %snapshot.environment,
                version = %snapshot.version,
                "Config module initialized"
            );
        }
    }

    /// Like [`for_root`](Self::for_root) with options produced asynchronously.
    pub async fn for_root_async<F>(options: F) -> Result<Self, ConfigError>
    where
        F: Future<Output = ConfigModuleOptions>,
    {
        Self::for_root(options.await)
    }

    pub fn service(&self) -> Arc<MemoryConfigService> {
        Arc::clone(&self.service)
    }

    pub fn health_checker(&self) -> &ConfigHealthChecker {
        &self.checker
    }

    pub fn monitor(&self) -> Option<&Arc<ConfigMonitor>> {
        self.monitor.as_ref()
    }

    /// Report produced at load time, when validation was enabled.
    pub fn validation(&self) -> Option<&ValidationReport> {
        self.validation.as_ref()
    }

    /// Stop the monitor task and wait for it.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.monitor_task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Configuration monitor task ended abnormally");
            }
        }
    }
}

impl Drop for ConfigModule {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

//! # Platform Bootstrap
//!
//! Composes the platform packages into a running service:
//!
//! 1. load and validate configuration
//! 2. install the log subscriber from the logging section, then log the
//!    configuration report
//! 3. build the exception filter
//! 4. connect the database and start its health monitor
//!
//! [`Platform::router`] exposes the health endpoint and renders unknown
//! routes as problem details.

pub mod routes;
pub mod server;

use anyhow::Context;
use config::{ConfigModule, ConfigModuleOptions, DEFAULT_MONITOR_INTERVAL, LoggingConfig};
use database::{DatabaseModule, DatabaseModuleOptions};
use errors::{ExceptionFilter, ExceptionsModule, ExceptionsOptions, MessageProvider};
use logging::{LogFormat, Logger, LoggerModule, LoggingOptions};
use std::sync::Arc;

pub use routes::HealthResponse;
pub use server::shutdown_signal;

/// What to start and how.
#[derive(Clone)]
pub struct PlatformOptions {
    pub service_name: String,
    pub config: ConfigModuleOptions,
    pub connect_database: bool,
    pub run_migrations: bool,
    pub documentation_url: Option<String>,
    /// Defaults to on outside production
    pub enable_stack_trace: Option<bool>,
    pub message_provider: Option<Arc<dyn MessageProvider>>,
}

impl Default for PlatformOptions {
    fn default() -> Self {
        Self {
            service_name: "platform".to_string(),
            config: ConfigModuleOptions::new().with_monitor(DEFAULT_MONITOR_INTERVAL),
            connect_database: true,
            run_migrations: false,
            documentation_url: None,
            enable_stack_trace: None,
            message_provider: None,
        }
    }
}

pub struct Platform {
    pub config: ConfigModule,
    pub logger: Logger,
    pub exceptions: Arc<ExceptionFilter>,
    pub database: Option<DatabaseModule>,
}

impl Platform {
    pub async fn bootstrap(options: PlatformOptions) -> anyhow::Result<Self> {
        // The subscriber is configured from the snapshot, so the config
        // report waits until it is installed.
        let config = ConfigModule::for_root(options.config.clone().defer_report(true))
            .context("Failed to load configuration")?;
        let snapshot = config.service().snapshot()?;

        let logger = LoggerModule::for_root(logging_options(&snapshot.logging, &options.service_name)?)
            .context("Failed to initialize logging")?;
        config.report();

        let exceptions = Arc::new(ExceptionsModule::for_root(ExceptionsOptions {
            documentation_url: options.documentation_url.clone(),
            enable_stack_trace: options
                .enable_stack_trace
                .unwrap_or(!snapshot.is_production()),
            message_provider: options.message_provider.clone(),
            ..ExceptionsOptions::default()
        }));

        let database = if options.connect_database {
            let db_options = DatabaseModuleOptions::from_config(&snapshot)?
                .with_migrations(options.run_migrations);
            Some(
                DatabaseModule::for_root(db_options)
                    .await
                    .context("Failed to connect to database")?,
            )
        } else {
            None
        };

        logger.info(format!(
            "{} v{} bootstrapped for environment '{}'",
            options.service_name, snapshot.version, snapshot.environment
        ));

        Ok(Self {
            config,
            logger,
            exceptions,
            database,
        })
    }

    pub fn router(&self) -> axum::Router {
        routes::create_router(self)
    }

    /// Stop background tasks and close the database.
    pub async fn shutdown(self) {
        if let Some(database) = &self.database {
            database.close().await;
        }
        self.config.shutdown().await;
        self.logger.info("Platform stopped");
    }
}

/// Map the logging section of the snapshot onto subscriber options.
pub fn logging_options(
    logging: &LoggingConfig,
    service_name: &str,
) -> anyhow::Result<LoggingOptions> {
    let format: LogFormat = logging
        .format
        .parse()
        .with_context(|| format!("Invalid LOG_FORMAT '{}'", logging.format))?;
    Ok(LoggingOptions {
        level: logging.level.clone(),
        format,
        include_location: logging.include_location,
        service_name: service_name.to_string(),
    })
}

//! # Configuration Health Check
//!
//! Sanity checks on the live snapshot plus a consistency check between the
//! typed accessors and the dotted-path adapter. A check never fails; any
//! error it runs into becomes an issue in the report.

use crate::adapter::ConfigAdapter;
use crate::error::ConfigError;
use crate::schema::MIN_JWT_SECRET_LENGTH;
use crate::service::MemoryConfigService;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigHealthReport {
    pub is_healthy: bool,
    pub issues: Vec<String>,
    pub checked_at: DateTime<Utc>,
}

impl ConfigHealthReport {
    fn from_issues(issues: Vec<String>) -> Self {
        Self {
            is_healthy: issues.is_empty(),
            issues,
            checked_at: Utc::now(),
        }
    }
}

/// Each run reads one snapshot; the cross-check compares within it.
#[derive(Clone)]
pub struct ConfigHealthChecker {
    service: Arc<MemoryConfigService>,
    adapter: ConfigAdapter,
}

impl ConfigHealthChecker {
    pub fn new(service: Arc<MemoryConfigService>) -> Self {
        let adapter = ConfigAdapter::new(Arc::clone(&service));
        Self { service, adapter }
    }

    pub fn check(&self) -> ConfigHealthReport {
        let issues = match self.collect_issues() {
            Ok(issues) => issues,
            Err(err) => vec![err.to_string()],
        };
        ConfigHealthReport::from_issues(issues)
    }

    fn collect_issues(&self) -> Result<Vec<String>, ConfigError> {
        let snapshot = self.service.snapshot()?;
        let mut issues = Vec::new();

        if snapshot.api.port == 0 {
            issues.push(format!("api.port out of range: {}", snapshot.api.port));
        }

        for (path, value) in [
            ("api.host", &snapshot.api.host),
            ("database.host", &snapshot.database.host),
            ("database.name", &snapshot.database.name),
            ("redis.host", &snapshot.redis.host),
            ("mongodb.uri", &snapshot.mongodb.uri),
        ] {
            if value.trim().is_empty() {
                issues.push(format!("{path} is empty"));
            }
        }

        let secret_len = snapshot.auth.jwt_secret.chars().count();
        if secret_len < MIN_JWT_SECRET_LENGTH {
            issues.push(format!(
                "auth.jwt_secret is too short ({secret_len} < {MIN_JWT_SECRET_LENGTH})"
            ));
        }

        let typed: [(&str, Value); 6] = [
            ("api.port", json!(snapshot.api.port)),
            ("api.host", json!(snapshot.api.host)),
            ("database.host", json!(snapshot.database.host)),
            ("database.port", json!(snapshot.database.port)),
            ("redis.port", json!(snapshot.redis.port)),
            ("environment", json!(snapshot.environment)),
        ];
        for (path, expected) in typed {
            let actual = self.adapter.get_in(&snapshot, path)?;
            if actual.as_ref() != Some(&expected) {
                issues.push(format!(
                    "{path} mismatch between typed accessor ({expected}) and adapter ({})",
                    actual.map_or_else(|| "missing".to_string(), |v| v.to_string())
                ));
            }
        }

        Ok(issues)
    }
}

//! Dotted-path facade over the configuration service.
//!
//! Consumers that only ever asked for `"section.key"` strings keep working
//! through this adapter without touching the typed API.

use crate::error::ConfigError;
use crate::schema::ApplicationMemoryConfig;
use crate::service::MemoryConfigService;
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct ConfigAdapter {
    service: Arc<MemoryConfigService>,
}

impl ConfigAdapter {
    pub fn new(service: Arc<MemoryConfigService>) -> Self {
        Self { service }
    }

    pub fn get(&self, path: &str) -> Result<Option<Value>, ConfigError> {
        self.service.get(path)
    }

    pub fn get_or(&self, path: &str, default: Value) -> Result<Value, ConfigError> {
        self.service.get_or(path, default)
    }

    pub fn has(&self, path: &str) -> Result<bool, ConfigError> {
        self.service.has(path)
    }

    pub fn snapshot(&self) -> Result<Arc<ApplicationMemoryConfig>, ConfigError> {
        self.service.snapshot()
    }

    /// Path lookup pinned to `snapshot` rather than the live one.
    pub fn get_in(
        &self,
        snapshot: &ApplicationMemoryConfig,
        path: &str,
    ) -> Result<Option<Value>, ConfigError> {
        MemoryConfigService::lookup(snapshot, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_delegates_to_service() {
        let env: HashMap<String, String> = [("API_HOST".to_string(), "127.0.0.1".to_string())].into();
        let service = Arc::new(MemoryConfigService::with_source(Arc::new(env)));
        let adapter = ConfigAdapter::new(Arc::clone(&service));

        assert_eq!(adapter.get("api.host"), Err(ConfigError::NotLoaded));

        service.load();
        assert_eq!(adapter.get("api.host").unwrap(), Some(json!("127.0.0.1")));
        assert!(adapter.has("auth.jwt_secret").unwrap());
        assert_eq!(adapter.get_or("x.y", json!(1)).unwrap(), json!(1));
        assert_eq!(adapter.snapshot().unwrap().api.host, "127.0.0.1");
    }

    #[test]
    fn test_get_in_reads_the_given_snapshot() {
        let env = Arc::new(parking_lot::RwLock::new(HashMap::from([(
            "API_PORT".to_string(),
            "3000".to_string(),
        )])));
        let service = Arc::new(MemoryConfigService::with_source(env.clone()));
        let adapter = ConfigAdapter::new(Arc::clone(&service));

        let held = service.load();
        env.write().insert("API_PORT".to_string(), "4000".to_string());
        service.reload();

        assert_eq!(adapter.get_in(&held, "api.port").unwrap(), Some(json!(3000)));
        assert_eq!(adapter.get("api.port").unwrap(), Some(json!(4000)));
    }
}

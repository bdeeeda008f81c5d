//! Driver registry for looking up session drivers by id

use std::collections::HashMap;
use std::sync::Arc;

use sqlrun_core::{Result, Session, SessionConfig, SessionDriver, SqlRunError};

/// Registry of available session drivers
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn SessionDriver>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Create a registry with all built-in drivers registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        #[cfg(feature = "snowflake")]
        registry.register(Arc::new(crate::snowflake::SnowflakeDriver::new()));
        #[cfg(feature = "sqlite")]
        registry.register(Arc::new(crate::sqlite::SqliteDriver::new()));

        registry
    }

    /// Register a new driver
    pub fn register(&mut self, driver: Arc<dyn SessionDriver>) {
        let id = driver.id().to_string();
        tracing::debug!(driver = %id, "registering session driver");
        self.drivers.insert(id, driver);
    }

    /// Get a driver by id
    pub fn get(&self, id: &str) -> Option<Arc<dyn SessionDriver>> {
        let driver = self.drivers.get(id).cloned();
        if driver.is_none() {
            tracing::warn!(driver = %id, "driver not found in registry");
        }
        driver
    }

    /// List all registered driver ids, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.drivers.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Check if a driver is registered
    pub fn has(&self, id: &str) -> bool {
        self.drivers.contains_key(id)
    }

    /// Open a session with the driver named by `config.driver`
    pub async fn connect(&self, config: &SessionConfig) -> Result<Arc<dyn Session>> {
        let driver = self.get(&config.driver).ok_or_else(|| {
            SqlRunError::Configuration(format!(
                "Unknown driver '{}' (available: {})",
                config.driver,
                self.list().join(", ")
            ))
        })?;

        driver.connect(config).await
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

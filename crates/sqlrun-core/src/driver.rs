//! Session driver trait definition

use crate::{Result, Session, SqlRunError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A driver that can open [`Session`]s
#[async_trait]
pub trait SessionDriver: Send + Sync {
    /// Get the driver identifier (e.g., "snowflake", "sqlite")
    fn id(&self) -> &'static str;

    /// Get the display name
    fn display_name(&self) -> &'static str {
        self.id()
    }

    /// Parameter keys this driver cannot connect without
    fn required_params(&self) -> &'static [&'static str] {
        &[]
    }

    /// Open a session
    ///
    /// Any error returned here happens before a single script runs and is
    /// treated by the runner as a setup failure.
    async fn connect(&self, config: &SessionConfig) -> Result<Arc<dyn Session>>;
}

/// Session configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Driver ID (e.g., "snowflake", "sqlite")
    pub driver: String,
    /// Driver-specific parameters (account, user, warehouse, path, ...)
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl SessionConfig {
    /// Create a new configuration for a driver
    pub fn new(driver: &str) -> Self {
        Self {
            driver: driver.to_string(),
            params: HashMap::new(),
        }
    }

    /// Create a SQLite configuration
    pub fn new_sqlite(database_path: &str) -> Self {
        Self::new("sqlite").with_param("path", database_path)
    }

    /// Set a parameter
    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Set a parameter only when a value is present
    pub fn with_optional_param(self, key: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.with_param(key, value),
            None => self,
        }
    }

    /// Get a non-empty string parameter
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.params
            .get(key)
            .filter(|v| !v.trim().is_empty())
            .cloned()
    }

    /// Get a parameter or fall back to a default
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|| default.to_string())
    }

    /// Report every missing key at once
    pub fn require(&self, keys: &[&str]) -> Result<()> {
        let missing: Vec<&str> = keys
            .iter()
            .copied()
            .filter(|key| self.get_string(key).is_none())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SqlRunError::Configuration(format!(
                "Missing {} settings: {}",
                self.driver,
                missing.join(", ")
            )))
        }
    }
}

//! SQLite driver implementation

use std::sync::Arc;

use async_trait::async_trait;
use sqlrun_core::{Result, Session, SessionConfig, SessionDriver, SqlRunError};

use crate::SqliteSession;

/// SQLite session driver
pub struct SqliteDriver;

impl SqliteDriver {
    /// Create a new SQLite driver instance
    pub fn new() -> Self {
        tracing::debug!("SQLite driver initialized");
        Self
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionDriver for SqliteDriver {
    fn id(&self) -> &'static str {
        "sqlite"
    }

    fn display_name(&self) -> &'static str {
        "SQLite"
    }

    fn required_params(&self) -> &'static [&'static str] {
        &["path"]
    }

    #[tracing::instrument(skip(self, config), fields(path = config.get_string("path").as_deref()))]
    async fn connect(&self, config: &SessionConfig) -> Result<Arc<dyn Session>> {
        let path = config.get_string("path").ok_or_else(|| {
            SqlRunError::Configuration(
                "SQLite requires a 'path' parameter (use :memory: for an in-memory database)"
                    .into(),
            )
        })?;

        let session = SqliteSession::open(&path).map_err(|e| {
            tracing::error!(error = %e, "failed to open SQLite session");
            e
        })?;

        tracing::info!(path = %path, "SQLite session created");
        Ok(Arc::new(session))
    }
}

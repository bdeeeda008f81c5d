//! Snowflake driver implementation

use std::sync::Arc;

use async_trait::async_trait;
use sqlrun_core::{Result, Session, SessionConfig, SessionDriver, SqlRunError};

use crate::config::REQUIRED_PARAMS;
use crate::{SnowflakeSession, SnowflakeSettings};

/// Snowflake SQL API driver
pub struct SnowflakeDriver;

impl SnowflakeDriver {
    /// Create a new Snowflake driver instance
    pub fn new() -> Self {
        tracing::debug!("Snowflake driver initialized");
        Self
    }
}

impl Default for SnowflakeDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionDriver for SnowflakeDriver {
    fn id(&self) -> &'static str {
        "snowflake"
    }

    fn display_name(&self) -> &'static str {
        "Snowflake"
    }

    fn required_params(&self) -> &'static [&'static str] {
        REQUIRED_PARAMS
    }

    /// Validate the settings and check the account answers `SELECT 1`
    #[tracing::instrument(skip(self, config), fields(account = config.get_string("account").as_deref()))]
    async fn connect(&self, config: &SessionConfig) -> Result<Arc<dyn Session>> {
        let settings = SnowflakeSettings::from_config(config)?;
        tracing::debug!(
            user = ?settings.user,
            role = ?settings.role,
            warehouse = ?settings.warehouse,
            database = ?settings.database,
            schema = ?settings.schema,
            token_type = settings.token_type.header_value(),
            "connecting to Snowflake"
        );

        let session = SnowflakeSession::new(settings)?;
        session.run_statement("SELECT 1").await.map_err(|e| {
            tracing::error!(error = %e, "Snowflake connection check failed");
            match e {
                SqlRunError::Connection(_) => e,
                other => SqlRunError::Connection(format!(
                    "Snowflake connection check failed: {}",
                    other.message()
                )),
            }
        })?;

        tracing::info!("Snowflake session created");
        Ok(Arc::new(session))
    }
}

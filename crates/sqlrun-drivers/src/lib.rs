//! sqlrun Drivers - Session driver implementations
//!
//! This crate bundles the concrete [`SessionDriver`]s and a registry that
//! picks one by id.

#[cfg(feature = "snowflake")]
pub use sqlrun_driver_snowflake as snowflake;
#[cfg(feature = "sqlite")]
pub use sqlrun_driver_sqlite as sqlite;

mod registry;

pub use registry::DriverRegistry;

/// Re-export commonly used types from sqlrun-core
pub use sqlrun_core::{
    ObjectDescriptor, Result, RowSet, Session, SessionConfig, SessionDriver, SqlRunError, Value,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct RefusingDriver;

    #[async_trait::async_trait]
    impl SessionDriver for RefusingDriver {
        fn id(&self) -> &'static str {
            "refusing"
        }

        async fn connect(&self, _config: &SessionConfig) -> Result<Arc<dyn Session>> {
            Err(SqlRunError::Connection("refused".into()))
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = DriverRegistry::new();
        assert!(registry.list().is_empty());
        assert!(registry.get("sqlite").is_none());
    }

    #[test]
    fn test_register_keys_by_id() {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(RefusingDriver));

        assert!(registry.has("refusing"));
        assert_eq!(registry.get("refusing").map(|d| d.display_name()), Some("refusing"));
    }

    #[cfg(all(feature = "snowflake", feature = "sqlite"))]
    #[test]
    fn test_defaults_register_bundled_drivers() {
        let registry = DriverRegistry::default();
        assert_eq!(registry.list(), vec!["snowflake", "sqlite"]);
    }

    #[tokio::test]
    async fn test_connect_unknown_driver() {
        let registry = DriverRegistry::new();

        let err = match registry.connect(&SessionConfig::new("oracle")).await {
            Err(err) => err,
            Ok(_) => panic!("oracle is not registered"),
        };
        assert!(matches!(err, SqlRunError::Configuration(_)));
        assert!(err.message().starts_with("Unknown driver 'oracle'"));
    }

    #[tokio::test]
    async fn test_connect_passes_driver_errors_through() {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(RefusingDriver));

        let result = registry.connect(&SessionConfig::new("refusing")).await;
        assert!(matches!(result, Err(SqlRunError::Connection(_))));
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_connect_sqlite_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.db");
        let registry = DriverRegistry::with_defaults();

        let session = registry
            .connect(&SessionConfig::new_sqlite(&path.to_string_lossy()))
            .await
            .unwrap();

        session
            .run_statement("CREATE TABLE budget (id INTEGER);")
            .await
            .unwrap();
        assert_eq!(session.driver_name(), "sqlite");
        assert!(path.exists());
    }
}

//! Error types for sqlrun

use thiserror::Error;

/// Core error type for session operations
#[derive(Error, Debug)]
pub enum SqlRunError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

impl SqlRunError {
    /// The message reported for this error, without the category prefix.
    ///
    /// Failure classification inspects this text, so drivers should put the
    /// database's own error message here verbatim.
    pub fn message(&self) -> String {
        match self {
            SqlRunError::Connection(msg)
            | SqlRunError::Query(msg)
            | SqlRunError::Configuration(msg)
            | SqlRunError::Http(msg)
            | SqlRunError::Protocol(msg)
            | SqlRunError::NotSupported(msg)
            | SqlRunError::Timeout(msg)
            | SqlRunError::Other(msg) => msg.clone(),
            SqlRunError::Io(err) => err.to_string(),
            SqlRunError::Serialization(err) => err.to_string(),
        }
    }
}

/// Result type alias for sqlrun operations
pub type Result<T> = std::result::Result<T, SqlRunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_strips_category() {
        let err = SqlRunError::Query("Object 'T1' already exists.".to_string());
        assert_eq!(err.message(), "Object 'T1' already exists.");
        assert_eq!(err.to_string(), "Query error: Object 'T1' already exists.");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.sql");
        let err: SqlRunError = io.into();
        assert!(matches!(err, SqlRunError::Io(_)));
        assert_eq!(err.message(), "missing.sql");
    }
}

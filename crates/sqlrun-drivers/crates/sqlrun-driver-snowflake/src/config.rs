//! Snowflake connection settings

use std::time::Duration;

use sqlrun_core::{Result, SessionConfig, SqlRunError};

/// Keys a Snowflake session cannot be opened without
pub(crate) const REQUIRED_PARAMS: &[&str] = &["account", "token"];

const DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 600;
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// How the bearer token was issued
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenType {
    #[default]
    OAuth,
    KeypairJwt,
    ProgrammaticAccessToken,
}

impl TokenType {
    /// Value of the `X-Snowflake-Authorization-Token-Type` header
    pub fn header_value(self) -> &'static str {
        match self {
            TokenType::OAuth => "OAUTH",
            TokenType::KeypairJwt => "KEYPAIR_JWT",
            TokenType::ProgrammaticAccessToken => "PROGRAMMATIC_ACCESS_TOKEN",
        }
    }

    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_uppercase().as_str() {
            "OAUTH" => Ok(TokenType::OAuth),
            "KEYPAIR_JWT" | "JWT" => Ok(TokenType::KeypairJwt),
            "PROGRAMMATIC_ACCESS_TOKEN" | "PAT" => Ok(TokenType::ProgrammaticAccessToken),
            other => Err(SqlRunError::Configuration(format!(
                "Unknown Snowflake token type '{}' (expected OAUTH, KEYPAIR_JWT or PROGRAMMATIC_ACCESS_TOKEN)",
                other
            ))),
        }
    }
}

/// Validated Snowflake settings
#[derive(Debug, Clone)]
pub struct SnowflakeSettings {
    pub account: String,
    pub user: Option<String>,
    pub token: String,
    pub token_type: TokenType,
    pub role: Option<String>,
    pub warehouse: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    /// Server-side statement timeout, in seconds
    pub statement_timeout: u64,
    /// Delay between status polls of a statement still running
    pub poll_interval: Duration,
    /// Overrides `https://{account}.snowflakecomputing.com`
    pub endpoint: Option<String>,
}

impl SnowflakeSettings {
    /// Read settings from a session config, reporting every missing key at once
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        config.require(REQUIRED_PARAMS)?;

        let token_type = match config.get_string("token_type") {
            Some(value) => TokenType::parse(&value)?,
            None => TokenType::default(),
        };

        Ok(Self {
            account: config.get_or("account", ""),
            user: config.get_string("user"),
            token: config.get_or("token", ""),
            token_type,
            role: config.get_string("role"),
            warehouse: config.get_string("warehouse"),
            database: config.get_string("database"),
            schema: config.get_string("schema"),
            statement_timeout: parse_u64(config, "timeout", DEFAULT_STATEMENT_TIMEOUT_SECS)?,
            poll_interval: Duration::from_millis(parse_u64(
                config,
                "poll_interval_ms",
                DEFAULT_POLL_INTERVAL_MS,
            )?),
            endpoint: config.get_string("endpoint"),
        })
    }

    /// Base URL of the account
    pub fn base_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.snowflakecomputing.com", self.account),
        }
    }

    pub fn statements_url(&self) -> String {
        format!("{}/api/v2/statements", self.base_url())
    }

    pub fn statement_status_url(&self, handle: &str) -> String {
        format!("{}/api/v2/statements/{}", self.base_url(), handle)
    }
}

fn parse_u64(config: &SessionConfig, key: &str, default: u64) -> Result<u64> {
    match config.get_string(key) {
        Some(value) => value.trim().parse().map_err(|_| {
            SqlRunError::Configuration(format!("'{}' must be a whole number, got '{}'", key, value))
        }),
        None => Ok(default),
    }
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sqlrun_core::SessionConfig;
use sqlrun_script::{ModeSelection, RunOptions};

/// sqlrun - ordered, session-aware execution of SQL deployment scripts
#[derive(Parser, Debug)]
#[command(name = "sqlrun")]
#[command(version)]
#[command(about = "Run an ordered list of SQL scripts against a warehouse", long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute the scripts listed in a manifest
    Run(RunArgs),
    /// Print the statements a script would be split into
    Split(SplitArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run manifest (TOML)
    #[arg(short = 'm', long = "manifest", value_name = "FILE")]
    pub manifest: PathBuf,

    /// Session driver
    #[arg(long = "driver", value_enum, default_value_t = DriverKind::Snowflake)]
    pub driver: DriverKind,

    /// Database file for the sqlite driver
    #[arg(long = "database", value_name = "PATH", required_if_eq("driver", "sqlite"))]
    pub database: Option<PathBuf>,

    /// Override the execution mode of every file
    #[arg(long = "mode", value_enum)]
    pub mode: Option<ModeArg>,

    /// Exit with status 1 when any statement failed
    #[arg(long = "fail-on-error")]
    pub fail_on_error: bool,

    /// List objects matching this LIKE pattern after the run
    #[arg(long = "summary-pattern", value_name = "PATTERN")]
    pub summary_pattern: Option<String>,

    #[command(flatten)]
    pub snowflake: SnowflakeArgs,
}

/// Snowflake connection settings
#[derive(Args, Debug, Default)]
pub struct SnowflakeArgs {
    /// Account identifier (e.g. xy12345.eu-west-1)
    #[arg(long = "account", env = "SNOWFLAKE_ACCOUNT")]
    pub account: Option<String>,

    #[arg(long = "user", env = "SNOWFLAKE_USER")]
    pub user: Option<String>,

    /// Bearer token (OAuth, key-pair JWT or programmatic access token)
    #[arg(long = "token", env = "SNOWFLAKE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// OAUTH, KEYPAIR_JWT or PROGRAMMATIC_ACCESS_TOKEN
    #[arg(long = "token-type", env = "SNOWFLAKE_TOKEN_TYPE")]
    pub token_type: Option<String>,

    #[arg(long = "role", env = "SNOWFLAKE_ROLE")]
    pub role: Option<String>,

    #[arg(long = "warehouse", env = "SNOWFLAKE_WAREHOUSE")]
    pub warehouse: Option<String>,

    #[arg(id = "sf_database", long = "sf-database", env = "SNOWFLAKE_DATABASE")]
    pub database: Option<String>,

    #[arg(long = "schema", env = "SNOWFLAKE_SCHEMA")]
    pub schema: Option<String>,

    /// Statement timeout in seconds
    #[arg(long = "timeout", value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// SQL script to split
    pub file: PathBuf,

    /// Print the units as JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DriverKind {
    Snowflake,
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Auto,
    Script,
    Split,
}

impl From<ModeArg> for ModeSelection {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => ModeSelection::Auto,
            ModeArg::Script => ModeSelection::Script,
            ModeArg::Split => ModeSelection::Split,
        }
    }
}

impl RunArgs {
    /// Session configuration for the selected driver
    pub fn session_config(&self) -> anyhow::Result<SessionConfig> {
        match self.driver {
            DriverKind::Sqlite => {
                let path = self
                    .database
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("--database is required with --driver sqlite"))?;
                Ok(SessionConfig::new_sqlite(&path.to_string_lossy()))
            }
            DriverKind::Snowflake => {
                let sf = &self.snowflake;
                Ok(SessionConfig::new("snowflake")
                    .with_optional_param("account", sf.account.as_deref())
                    .with_optional_param("user", sf.user.as_deref())
                    .with_optional_param("token", sf.token.as_deref())
                    .with_optional_param("token_type", sf.token_type.as_deref())
                    .with_optional_param("role", sf.role.as_deref())
                    .with_optional_param("warehouse", sf.warehouse.as_deref())
                    .with_optional_param("database", sf.database.as_deref())
                    .with_optional_param("schema", sf.schema.as_deref())
                    .with_optional_param("timeout", sf.timeout.map(|t| t.to_string())))
            }
        }
    }

    /// Manifest options with the command line overrides applied
    pub fn apply_overrides(&self, mut options: RunOptions) -> RunOptions {
        if let Some(mode) = self.mode {
            options.mode = mode.into();
        }
        if self.fail_on_error {
            options.fail_on_error = true;
        }
        if let Some(pattern) = &self.summary_pattern {
            options.summary_pattern = Some(pattern.clone());
        }
        options
    }
}

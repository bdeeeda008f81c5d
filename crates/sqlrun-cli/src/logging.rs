//! Logging setup for the `sqlrun` binary
//!
//! Logs go to stderr so the progress lines on stdout stay readable when
//! redirected. `RUST_LOG` takes precedence over both defaults.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "warn,sqlrun=info,sqlrun_script=info,sqlrun_drivers=info";

const VERBOSE_FILTER: &str = "info,sqlrun=debug,sqlrun_script=debug,sqlrun_core=debug,sqlrun_drivers=debug,sqlrun_driver_snowflake=debug,sqlrun_driver_sqlite=debug";

/// Filter directives used when `RUST_LOG` is not set
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER }
}

pub fn init(verbose: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init()?;

    tracing::debug!(verbose, "logging initialized");
    Ok(())
}

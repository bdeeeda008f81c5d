//! sqlrun - runs an ordered list of SQL deployment scripts
//!
//! # Usage
//!
//! ```bash
//! # Deploy against Snowflake, settings from SNOWFLAKE_* variables
//! sqlrun run --manifest deploy.toml
//!
//! # Rehearse the same manifest against a local SQLite file
//! sqlrun run --manifest deploy.toml --driver sqlite --database rehearsal.db
//!
//! # Show how a script will be split
//! sqlrun split System/processbudget/02_usp_ProcessBudget.sql --json
//! ```

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use sqlrun_drivers::DriverRegistry;
use sqlrun_script::{RunManifest, ScriptRunner, split};

mod args;
mod console;
mod logging;

use args::{Cli, Command, RunArgs, SplitArgs};
use console::{ConsoleObserver, render_summary};

/// Exit status for failures before the first script ran
const SETUP_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Failed to initialize logging: {e:#}");
    }

    let result = match cli.command {
        Command::Run(args) => run(args).await,
        Command::Split(args) => split_file(&args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "sqlrun failed");
            eprintln!("error: {e:#}");
            ExitCode::from(SETUP_FAILURE)
        }
    }
}

async fn run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let manifest = RunManifest::load(&args.manifest)
        .with_context(|| format!("Failed to load manifest {}", args.manifest.display()))?;
    let options = args.apply_overrides(manifest.run_options());
    let files = manifest.script_files();
    let fail_on_error = options.fail_on_error;

    let config = args.session_config()?;
    let registry = DriverRegistry::with_defaults();
    let session = registry
        .connect(&config)
        .await
        .with_context(|| format!("Failed to open {} session", config.driver))?;

    tracing::info!(
        driver = %config.driver,
        files = files.len(),
        base_dir = %manifest.base_dir().display(),
        "starting run"
    );

    let mut observer = ConsoleObserver::new(std::io::stdout());
    let runner = ScriptRunner::new(options);
    let outcome = runner
        .run_with_observer(session.as_ref(), &files, &mut observer)
        .await;

    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "failed to close session");
    }

    let report = outcome.context("Run aborted before the first script")?;
    print!("{}", render_summary(&report));

    let code = report.exit_status().exit_code(fail_on_error);
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}

fn split_file(args: &SplitArgs) -> anyhow::Result<ExitCode> {
    let text = read_script(&args.file)?;
    let result = split(&text);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for unit in &result.units {
            println!(
                "-- unit {} ({:?}, line {})\n{}\n",
                unit.ordinal, unit.kind, unit.start_line, unit.text
            );
        }
        if result.incomplete {
            eprintln!("warning: script ends inside an unterminated procedure definition");
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn read_script(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

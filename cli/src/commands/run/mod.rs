//! # procrun Run Command
//!
//! File: cli/src/commands/run/mod.rs
//!
//! ## Overview
//!
//! This module implements `procrun run`, which executes an external command
//! through the process runner (`common::process`) and presents its output in
//! one of three modes:
//!
//! - **stream** (default): a `ConsoleSink` shows output on stderr as it arrives.
//!   A failure prints the generic "check output window" error.
//! - **deferred**: output is buffered and only shown if the command fails;
//!   on success the captured stdout is printed.
//! - **none**: no sink. On success the captured stdout is printed, on failure
//!   the error embeds the exit code and the full combined output.
//!
//! ## Architecture
//!
//! 1. Parse `RunArgs` with `clap`.
//! 2. Load configuration (`core::config`) for defaults.
//! 3. Merge flags over configuration into an `ExecRequest` (`build_request`).
//! 4. Run it with the sink selected by the output mode.
//!
//! ## Usage
//!
//! ```bash
//! # Stream output of a build
//! procrun run -- cargo build
//!
//! # Capture stdout for scripting, show output only on failure
//! procrun run --output deferred -- git rev-parse HEAD
//!
//! # Run in a directory with a timeout and an extra variable
//! procrun run -C ./app --timeout 60 -e RUST_LOG=debug -- ./scripts/check.sh
//! ```
//!
use crate::{
    common::{
        process::{self, BufferedSink, ExecRequest},
        ui::ConsoleSink,
    },
    core::{
        config::{self, OutputMode, RunnerConfig},
        error::{ProcrunError, Result},
    },
};
use anyhow::{anyhow, Context};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// # Run Arguments (`RunArgs`)
///
/// Command-line arguments accepted by `procrun run`.
#[derive(Parser, Debug)]
#[command(
    about = "Run an external command and capture its output",
    long_about = "Runs the command after `--` through the process runner, streaming or capturing its output.\n\
                  Flags override values from .procrun.toml and the user config file."
)]
pub struct RunArgs {
    /// Working directory for the command. Defaults to the configured directory, then the system temp directory.
    #[arg(long, short = 'C', value_name = "DIR")]
    cwd: Option<PathBuf>,

    /// Where the command's output goes while it runs.
    #[arg(long, short, value_enum)]
    output: Option<OutputMode>,

    /// Kill the command after this many seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Spawn the program directly instead of through the shell.
    #[arg(long)]
    no_shell: bool,

    /// Extra environment variable for the command (repeatable).
    #[arg(long = "env", short = 'e', value_name = "KEY=VALUE")]
    env: Vec<String>,

    /// The command and its arguments.
    #[arg(required = true, last = true)]
    command: Vec<String>,
}

/// # Handle Run Command (`handle_run`)
///
/// Builds the execution request from flags and configuration, runs it with
/// the sink for the selected output mode, and prints captured stdout where
/// the mode did not already show it.
///
/// ## Returns
///
/// * `Ok(())` when the command exits with code 0.
/// * `Err` wrapping the `ProcessError` (spawn failure, non-zero exit, timeout),
///   or a configuration/argument error.
pub async fn handle_run(args: RunArgs) -> Result<()> {
    info!("Handling run command...");
    debug!("Run args: {:?}", args);

    let cfg = config::load_config().context("Failed to load procrun configuration")?;
    let request = build_request(&args, &cfg.runner)?;
    let mode = args.output.unwrap_or(cfg.output.mode());
    debug!("Output mode: {:?}", mode);

    match mode {
        OutputMode::Stream => {
            let mut sink = ConsoleSink::stderr();
            process::execute_request(&request, Some(&mut sink)).await?;
        }
        OutputMode::Deferred => {
            let mut sink = BufferedSink::deferred(Box::new(io::stderr()));
            let stdout = process::execute_request(&request, Some(&mut sink)).await?;
            print_stdout(&stdout)?;
        }
        OutputMode::None => {
            let stdout = process::execute_request(&request, None).await?;
            print_stdout(&stdout)?;
        }
    }
    Ok(())
}

/// Merges flags over the runner configuration.
fn build_request(args: &RunArgs, runner: &RunnerConfig) -> Result<ExecRequest> {
    let (program, rest) = args.command.split_first().ok_or_else(|| {
        anyhow!(ProcrunError::ArgumentParsing(
            "No command provided to run.".to_string()
        ))
    })?;

    let mut request = ExecRequest::new(program.as_str(), rest.iter().cloned())
        .shell(runner.shell() && !args.no_shell);

    if let Some(dir) = &args.cwd {
        if !dir.is_dir() {
            return Err(anyhow!(ProcrunError::FileSystem(format!(
                "Working directory '{}' is not a directory.",
                dir.display()
            ))));
        }
        request = request.working_dir(dir);
    } else if let Some(dir) = &runner.working_dir {
        request = request.working_dir(dir);
    }

    match args.timeout.or(runner.timeout_secs) {
        Some(0) => {
            return Err(anyhow!(ProcrunError::ArgumentParsing(
                "--timeout must be greater than zero.".to_string()
            )))
        }
        Some(secs) => request = request.timeout(Duration::from_secs(secs)),
        None => {}
    }

    for (key, value) in &runner.env {
        request = request.env(key, value);
    }
    for pair in &args.env {
        let (key, value) = parse_env_pair(pair)?;
        request = request.env(key, value);
    }

    debug!("Built request: {:?}", request);
    Ok(request)
}

fn parse_env_pair(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(anyhow!(ProcrunError::ArgumentParsing(format!(
            "Invalid --env value '{}'. Expected KEY=VALUE.",
            pair
        )))),
    }
}

fn print_stdout(stdout: &str) -> Result<()> {
    let mut out = io::stdout().lock();
    out.write_all(stdout.as_bytes())
        .context("Failed to write command output")?;
    out.flush().context("Failed to flush stdout")?;
    Ok(())
}

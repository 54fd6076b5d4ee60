//! # procrun Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used throughout procrun.
//!
//! ## Architecture
//!
//! The error system consists of three components:
//! - `ProcrunError`: application errors (configuration, argument parsing, filesystem)
//! - `ProcessError`: the tagged failure returned by the process runner, so callers
//!   can branch on the failure kind without matching on message text
//! - `Result<T>`: a type alias for `anyhow::Result<T>` used by command handlers
//!
//! ## Examples
//!
//! ```rust,ignore
//! match process::execute(None, None, "git", &args).await {
//!     Ok(stdout) => println!("{}", stdout),
//!     Err(ProcessError::NonZeroExit { code, .. }) if code == 128 => { /* not a repo */ }
//!     Err(e) => return Err(e.into()),
//! }
//! ```
//!
use thiserror::Error;

/// Line terminator of the host platform, used to separate sections of
/// multi-line error messages.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Custom error type for the procrun application.
#[derive(Error, Debug)]
pub enum ProcrunError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Filesystem error: {0}")]
    FileSystem(String),

    #[error("Argument parsing error: {0}")]
    ArgumentParsing(String),
}

/// Failure of a single process runner invocation.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The OS could not start the process. The underlying error is surfaced unchanged.
    #[error(transparent)]
    Spawn(#[from] std::io::Error),

    /// The process exited non-zero and its output was already streamed to a sink.
    #[error("Failed to run \"{command}\" command. Check output window for more details.")]
    ShownOnSink { command: String },

    /// The process exited non-zero and no sink was present; carries the
    /// combined stdout+stderr text.
    #[error(
        "Failed to run \"{}\" command.{eol}exit code \"{code}\"{eol}{output}",
        display_command(.command, .args),
        eol = LINE_ENDING
    )]
    NonZeroExit {
        command: String,
        args: Vec<String>,
        code: i32,
        output: String,
    },

    /// The process was ended by a signal and reported no exit code.
    #[error("Command \"{command}\" was terminated by a signal.{eol}{output}", eol = LINE_ENDING)]
    Terminated { command: String, output: String },

    /// The process ran longer than the requested timeout and was killed.
    #[error("Command \"{command}\" timed out after {limit:?}.")]
    Timeout {
        command: String,
        limit: std::time::Duration,
    },

    /// Reading one of the child's output pipes failed.
    #[error("Failed to read {stream} of running command: {source}")]
    Output {
        stream: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl ProcessError {
    /// Exit code of the failed process, if it ran to completion.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::NonZeroExit { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Renders a command and its arguments the way they appear in sink lines and
/// error messages: the command followed by the space-joined arguments.
pub fn display_command(command: &str, args: &[String]) -> String {
    if args.is_empty() {
        command.to_string()
    } else {
        format!("{} {}", command, args.join(" "))
    }
}

/// Type alias for Result using anyhow::Error for command handlers.
pub type Result<T> = anyhow::Result<T>;

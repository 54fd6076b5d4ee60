//! # procrun Process Execution Utilities (`common::process`)
//!
//! File: cli/src/common/process/mod.rs
//!
//! ## Overview
//!
//! This module provides the process runner used by the `run` command: it spawns
//! an external command, streams its output to an optional sink while it runs,
//! and returns the captured standard output or a typed `ProcessError`.
//!
//! ## Architecture
//!
//! - **`runner`**: `ExecRequest` and the `execute` / `execute_request` functions.
//! - **`sink`**: the `OutputSink` trait and the in-memory `BufferedSink`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use procrun::common::process::{self, BufferedSink};
//!
//! # async fn run_example() -> anyhow::Result<()> {
//! // No sink: failures carry the full output.
//! let version = process::execute(None, None, "git", &["--version".to_string()]).await?;
//!
//! // With a sink: output is written to it live, failures point at it.
//! let mut sink = BufferedSink::new();
//! let listing = process::execute(Some(&mut sink), None, "ls", &[]).await?;
//! # Ok(())
//! # }
//! ```
//!
pub mod runner;
pub mod sink;

pub use runner::{execute, execute_request, ExecRequest};
pub use sink::{BufferedSink, OutputSink};

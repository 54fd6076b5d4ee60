//! # procrun Common Utilities (`common`)
//!
//! File: cli/src/common/mod.rs
//!
//! ## Overview
//!
//! Shared utility modules used by the command handlers, kept apart from
//! command-specific logic (`commands::`) and core infrastructure (`core::`).
//!
//! - **`process`**: the process runner and the `OutputSink` capability.
//! - **`ui`**: terminal output, including the streaming `ConsoleSink`.
//!

/// Executing external commands and capturing their output.
pub mod process;
/// Terminal output helpers.
pub mod ui;

//! # procrun Command Modules
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! This module aggregates the top-level command groups of the procrun CLI,
//! making them accessible to the main entry point (`main.rs`).
//!
//! ## Command Groups
//!
//! - `config`: inspect the effective configuration and where it is loaded from
//! - `run`: run an external command through the process runner
//!
//! Each group defines its own arguments structure and handler function.
//!

/// Command group for inspecting configuration. Includes subcommands `show` and `path`.
pub mod config;
/// Runs an external command with live, deferred or no output.
pub mod run;

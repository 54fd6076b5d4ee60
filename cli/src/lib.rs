//! # procrun Library
//!
//! File: cli/src/lib.rs
//!
//! Library side of the `procrun` crate. The process runner lives in
//! [`common::process`]; the `procrun` binary (`main.rs`) wires it to the
//! command line.
//!
pub mod commands; // Command handlers (run, config)
pub mod common; // Shared utilities (process runner, sinks)
pub mod core; // Core infrastructure (errors, config)

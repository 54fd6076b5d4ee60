//! # procrun Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! ## Overview
//!
//! Core infrastructure shared by the command handlers:
//! - `config`: configuration loading, merging, and validation
//! - `error`: application and process error types
//!
//! ```rust
//! use procrun::core::config; // For loading configuration
//! use procrun::core::error::{ProcrunError, Result}; // For error handling
//! ```
//!
pub mod config;
pub mod error;

//! # procrun CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration test files (`run.rs`, `config.rs`,
//! `main_tests.rs`). Each test binary includes this file with `mod common;`.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::path::Path;

/// # Get procrun Command (`procrun_cmd`)
///
/// Creates an `assert_cmd::Command` for the compiled `procrun` binary.
///
/// ## Panics
/// Panics if the `procrun` binary cannot be found via `Command::cargo_bin`.
pub fn procrun_cmd() -> Command {
    Command::cargo_bin("procrun").expect("Failed to find procrun binary for testing")
}

/// # Isolated procrun Command (`isolated_cmd`)
///
/// Like `procrun_cmd`, but runs from `dir` with the user config directory
/// pointed into `dir`, so configuration on the test machine is never read.
/// `dir` gets a `.git` directory to stop the project config search there.
pub fn isolated_cmd(dir: &Path) -> Command {
    std::fs::create_dir_all(dir.join(".git")).expect("Failed to create .git marker");
    let mut cmd = procrun_cmd();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join("xdg"))
        .env_remove("RUST_LOG");
    cmd
}

/// Writes a user config file where `isolated_cmd(dir)` will look for it on Linux.
pub fn write_user_config(dir: &Path, contents: &str) {
    let config_dir = dir.join("xdg").join("procrun");
    std::fs::create_dir_all(&config_dir).expect("Failed to create user config dir");
    std::fs::write(config_dir.join("config.toml"), contents).expect("Failed to write user config");
}

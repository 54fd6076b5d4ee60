//! # procrun Config Path Handler
//!
//! File: cli/src/commands/config/path.rs
//!
//! Implements `procrun config path`, listing where configuration is read from.
//!
use crate::core::{config, error::Result};
use anyhow::Context;
use clap::Parser;
use std::path::Path;

/// Arguments for the 'config path' subcommand.
#[derive(Parser, Debug, Default)]
#[command(about = "Print the configuration file locations procrun reads")]
pub struct PathArgs {}

pub async fn handle_path(_args: PathArgs) -> Result<()> {
    match config::user_config_path() {
        Some(path) => println!("User config:    {}", describe(&path)),
        None => println!("User config:    (no config directory on this platform)"),
    }
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    match config::find_project_config_path(&current_dir) {
        Some(path) => println!("Project config: {}", describe(&path)),
        None => println!("Project config: (none found from {})", current_dir.display()),
    }
    Ok(())
}

fn describe(path: &Path) -> String {
    if path.is_file() {
        path.display().to_string()
    } else {
        format!("{} (not found)", path.display())
    }
}

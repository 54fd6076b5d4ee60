//! # procrun Config Command Group
//!
//! File: cli/src/commands/config/mod.rs
//!
//! ## Overview
//!
//! `procrun config` inspects the configuration the `run` command would use:
//! - `show` (default): print the merged configuration as TOML
//! - `path`: print the user and project config file locations
//!
//! ```bash
//! procrun config
//! procrun config path
//! ```
//!
use crate::core::error::Result;
use clap::{Parser, Subcommand};

mod path;
mod show;

/// Top-level arguments for the 'config' command group.
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// The config subcommand to run (defaults to 'show').
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

/// Enum defining all subcommands under 'procrun config'.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the effective merged configuration (default)
    Show(show::ShowArgs),
    /// Print the configuration file locations that are searched
    Path(path::PathArgs),
}

/// Main handler function for the 'config' command group.
pub async fn handle_config(args: ConfigArgs) -> Result<()> {
    let command = args
        .command
        .unwrap_or(ConfigCommand::Show(show::ShowArgs {}));

    match command {
        ConfigCommand::Show(args) => show::handle_show(args).await?,
        ConfigCommand::Path(args) => path::handle_path(args).await?,
    }
    Ok(())
}

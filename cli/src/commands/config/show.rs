//! # procrun Config Show Handler
//!
//! File: cli/src/commands/config/show.rs
//!
//! Implements `procrun config show`: loads the merged configuration exactly as
//! `procrun run` would and prints it as TOML.
//!
use crate::core::{config, error::Result};
use anyhow::Context;
use clap::Parser;
use tracing::info;

/// Arguments for the 'config show' subcommand.
#[derive(Parser, Debug, Default)]
#[command(about = "Print the effective procrun configuration")]
pub struct ShowArgs {}

pub async fn handle_show(_args: ShowArgs) -> Result<()> {
    info!("Handling config show command...");
    let cfg = config::load_config().context("Failed to load procrun configuration")?;
    print!("{}", render(&cfg)?);
    Ok(())
}

fn render(cfg: &config::Config) -> Result<String> {
    toml::to_string_pretty(cfg).context("Failed to render configuration as TOML")
}

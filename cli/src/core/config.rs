//! # procrun Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module loads, merges, expands and validates the procrun
//! configuration, which supplies defaults for how commands are run
//! (working directory, shell mode, timeout, extra environment) and how their
//! output is presented.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Command-line flags (applied by the `run` command, not here)
//! 2. Project-specific `.procrun.toml` in the current directory or an ancestor,
//!    searched up to the first directory containing `.git`
//! 3. User-specific `<config dir>/procrun/config.toml`
//! 4. Default values defined in the code
//!
//! ## Examples
//!
//! ```toml
//! [runner]
//! working_dir = "~/scratch"
//! shell = true
//! timeout_secs = 30
//! env = { LANG = "C" }
//!
//! [output]
//! mode = "deferred"
//! ```
//!
use crate::core::error::{ProcrunError, Result};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// How commands are spawned.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Working directory for commands (can use ~). The system temp directory when unset.
    #[serde(default)]
    pub working_dir: Option<String>,
    /// Run commands through the platform shell. On when unset.
    #[serde(default)]
    pub shell: Option<bool>,
    /// Kill commands that run longer than this many seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Extra environment variables for every command.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl RunnerConfig {
    /// Effective shell mode.
    pub fn shell(&self) -> bool {
        self.shell.unwrap_or(DEFAULT_SHELL)
    }
}

/// How command output is presented.
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default)]
    pub mode: Option<OutputMode>,
}

impl OutputConfig {
    /// Effective output mode.
    pub fn mode(&self) -> OutputMode {
        self.mode.unwrap_or_default()
    }
}

/// Where a running command's output goes.
#[derive(
    Deserialize, Serialize, Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Stream output to the terminal as it arrives.
    #[default]
    Stream,
    /// Buffer output and show it only if the command fails.
    Deferred,
    /// No live output; failures include the full output.
    None,
}

const DEFAULT_SHELL: bool = true;
const PROJECT_CONFIG_FILENAME: &str = ".procrun.toml";
const USER_CONFIG_FILENAME: &str = "config.toml";

/// Loads the merged, expanded and validated configuration.
pub fn load_config() -> Result<Config> {
    let user_config = match user_config_path() {
        Some(path) if path.exists() => {
            info!("Loading user configuration from: {}", path.display());
            Some(load_config_from_path(&path)?)
        }
        Some(path) => {
            debug!("User configuration file not found at {}", path.display());
            None
        }
        None => {
            warn!("Could not determine user config directory.");
            None
        }
    };
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    let project_config = match find_project_config_path(&current_dir) {
        Some(path) => {
            info!("Loading project configuration from: {}", path.display());
            Some(load_config_from_path(&path)?)
        }
        None => {
            debug!("No project configuration file (.procrun.toml) found in current directory or ancestors.");
            None
        }
    };
    let mut merged = merge_configs(user_config.unwrap_or_default(), project_config);
    apply_defaults(&mut merged);
    expand_config_paths(&mut merged);
    validate_config(&merged).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged);
    Ok(merged)
}

/// Location of the user configuration file, whether or not it exists.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "procrun", "procrun")
        .map(|dirs| dirs.config_dir().join(USER_CONFIG_FILENAME))
}

/// Searches `start` and its ancestors for `.procrun.toml`, stopping at the
/// first directory that contains `.git`.
pub fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Every value set in the project file wins over the user file; `env` maps
/// are combined, with project entries overriding user entries.
fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let project = match project {
        Some(p) => p,
        None => return user,
    };
    let mut env = user.runner.env;
    env.extend(project.runner.env);
    Config {
        runner: RunnerConfig {
            working_dir: project.runner.working_dir.or(user.runner.working_dir),
            shell: project.runner.shell.or(user.runner.shell),
            timeout_secs: project.runner.timeout_secs.or(user.runner.timeout_secs),
            env,
        },
        output: OutputConfig {
            mode: project.output.mode.or(user.output.mode),
        },
    }
}

/// Fills the values neither file set, so `config show` prints them.
fn apply_defaults(config: &mut Config) {
    config.runner.shell.get_or_insert(DEFAULT_SHELL);
    config.output.mode.get_or_insert_with(OutputMode::default);
}

fn expand_config_paths(config: &mut Config) {
    if let Some(dir) = config.runner.working_dir.as_mut() {
        *dir = shellexpand::tilde(dir.as_str()).into_owned();
        debug!("Expanded working directory: {}", dir);
    }
}

fn validate_config(config: &Config) -> Result<()> {
    if let Some(dir) = &config.runner.working_dir {
        let dir = PathBuf::from(dir);
        if !dir.exists() {
            warn!(
                "Configured working directory '{}' does not exist.",
                dir.display()
            );
        } else if !dir.is_dir() {
            return Err(anyhow!(ProcrunError::Config(format!(
                "Configured working directory '{}' exists but is not a directory.",
                dir.display()
            ))));
        }
    }
    if config.runner.timeout_secs == Some(0) {
        return Err(anyhow!(ProcrunError::Config(
            "timeout_secs must be greater than zero.".to_string()
        )));
    }
    for key in config.runner.env.keys() {
        if key.is_empty() || key.contains('=') {
            return Err(anyhow!(ProcrunError::Config(format!(
                "Invalid environment variable name: '{}'.",
                key
            ))));
        }
    }
    Ok(())
}

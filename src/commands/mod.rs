//! Subcommands of the `clean-serverless` binary

pub mod init;
pub mod inspect;
mod names;
pub mod synth;

use anyhow::{Context, Result};
use clean_serverless_config::StackConfig;
use std::path::Path;

/// Load the stack configuration from an explicit file or the default locations
pub fn load_config(path: Option<&Path>) -> Result<StackConfig> {
    match path {
        Some(path) => StackConfig::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => StackConfig::load().context("Failed to load configuration"),
    }
}

// Process setup shared by every subcommand
//
// Environment files and logging/tracing

use anyhow::{Context, Result};
use clean_serverless_config::{LogFormat, LoggingConfig};
use std::path::Path;

/// Outcome of looking for an environment file, reported once tracing is up
#[derive(Debug)]
pub enum EnvFile {
    Loaded(std::path::PathBuf),
    NotFound,
}

/// Load variables from an explicit file, or from `./.env` when present.
///
/// Variables already set in the process environment take precedence.
pub fn load_env_file(path: Option<&Path>) -> Result<EnvFile> {
    match path {
        Some(path) => {
            dotenv::from_path(path)
                .with_context(|| format!("Failed to load env file: {}", path.display()))?;
            Ok(EnvFile::Loaded(path.to_path_buf()))
        }
        None => match dotenv::dotenv() {
            Ok(found) => Ok(EnvFile::Loaded(found)),
            Err(dotenv::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(EnvFile::NotFound)
            }
            Err(e) => Err(e).context("Failed to load .env file"),
        },
    }
}

/// Initialize tracing/logging from LoggingConfig
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_tracing(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Ignore the error if a subscriber is already set (idempotent)
    let _ = match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().json().with_writer(std::io::stderr)),
        ),
        LogFormat::Text => tracing::subscriber::set_global_default(
            registry.with(fmt::layer().with_writer(std::io::stderr)),
        ),
    };
}

// Configuration source loading.
//
// Priority order:
// 1. Environment variables (CLEAN_SERVERLESS_* prefix, raw DYNAMO_*)
// 2. Config file path from CLEAN_SERVERLESS_CONFIG
// 3. Inline config content from CLEAN_SERVERLESS_CONFIG_CONTENT
// 4. Default config files (./stack.toml, ./.clean-serverless.toml)
// 5. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::StackConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &["./stack.toml", "./.clean-serverless.toml"];

/// Load configuration using process environment and file access.
pub fn load_config() -> Result<StackConfig> {
    let config = load_from_file()?.unwrap_or_default();
    finish(config)
}

fn load_from_file() -> Result<Option<StackConfig>> {
    if let Ok(path) = env::var("CLEAN_SERVERLESS_CONFIG") {
        return read_config_file(Path::new(&path)).map(Some);
    }

    if let Ok(content) = env::var("CLEAN_SERVERLESS_CONFIG_CONTENT") {
        let config = StackConfig::from_toml(&content)
            .context("Failed to parse inline config from CLEAN_SERVERLESS_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    for path in DEFAULT_CONFIG_FILES {
        let path = Path::new(path);
        if path.exists() {
            return read_config_file(path).map(Some);
        }
    }

    debug!("No config file found, using built-in defaults");
    Ok(None)
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if file doesn't exist or can't be parsed.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<StackConfig> {
    let config = read_config_file(path.as_ref())?;
    finish(config)
}

fn read_config_file(path: &Path) -> Result<StackConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = StackConfig::from_toml(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    debug!(path = %path.display(), "Loaded config file");
    Ok(config)
}

fn finish(mut config: StackConfig) -> Result<StackConfig> {
    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    config.validate()?;
    Ok(config)
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn read_config_file_parses_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [stack]
            name = "SampleStack"

            [bucket]
            name = "sample-bucket-01"
            "#
        )
        .unwrap();

        let config = read_config_file(file.path()).unwrap();
        assert_eq!(config.stack.name, "SampleStack");
        assert_eq!(config.bucket.name, "sample-bucket-01");
        assert_eq!(config.api.stage, "dev");
    }

    #[test]
    fn read_config_file_reports_path_on_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[stack\nname = ").unwrap();

        let err = read_config_file(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_config_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}

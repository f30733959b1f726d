// clean-serverless-config - Stack configuration for topology synthesis
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from CLEAN_SERVERLESS_CONFIG env var
// 3. Config file contents from CLEAN_SERVERLESS_CONFIG_CONTENT env var
// 4. Default config file locations (./stack.toml, ./.clean-serverless.toml)
// 5. Built-in defaults (lowest priority)
//
// Configuration is loaded once and validated before any topology is built.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{EnvSource, MapEnvSource, ENV_PREFIX};
pub use validation::validate_bucket_name;

/// Environment variable carrying the table name handed to every compute unit
pub const TABLE_NAME_VAR: &str = "DYNAMO_TABLE_NAME";
/// Environment variable carrying the partition key attribute name
pub const PK_NAME_VAR: &str = "DYNAMO_PK_NAME";
/// Environment variable carrying the sort key attribute name
pub const SK_NAME_VAR: &str = "DYNAMO_SK_NAME";

/// Main stack configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StackConfig {
    #[serde(default)]
    pub stack: StackSettings,

    #[serde(default)]
    pub table: TableConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub compute: ComputeConfig,

    #[serde(default)]
    pub bucket: BucketConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackSettings {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            name: "CleanServerlessStack".to_string(),
            description: None,
        }
    }
}

/// Keyed record store settings, sourced from the DYNAMO_* variables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_key_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_key_name: Option<String>,
    #[serde(default)]
    pub missing_values: MissingValuePolicy,
}

/// What to do when a DYNAMO_* value is absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingValuePolicy {
    /// Refuse to build a topology
    #[default]
    Fail,
    /// Substitute empty strings and leave the table name to the provisioning engine
    Empty,
}

impl std::fmt::Display for MissingValuePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingValuePolicy::Fail => write!(f, "fail"),
            MissingValuePolicy::Empty => write!(f, "empty"),
        }
    }
}

impl std::str::FromStr for MissingValuePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fail" | "strict" => Ok(MissingValuePolicy::Fail),
            "empty" | "lenient" => Ok(MissingValuePolicy::Empty),
            _ => anyhow::bail!("Unsupported missing value policy: {}. Supported: fail, empty", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub name: String,
    pub stage: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            name: "CleanServerlessBookSampleAPI".to_string(),
            stage: "dev".to_string(),
        }
    }
}

/// Image build settings shared by every compute unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeConfig {
    pub image_dir: String,
    pub image_repository: String,
    pub function_prefix: String,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            image_dir: "../app".to_string(),
            image_repository: "clean-serverless-app".to_string(),
            function_prefix: "clean-serverless-".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketConfig {
    pub name: String,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            name: "clean-serverless-book-sample-bucket".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// The schedule handler only writes logs unless this is set
    #[serde(default)]
    pub grant_table_access: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

impl StackConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Load configuration from an explicit file (CLI `--config`)
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Apply overrides from `env` on top of `base` and validate the result.
    pub fn load_with_env<E: EnvSource>(base: StackConfig, env: &E) -> Result<Self> {
        let mut config = base;
        env_overrides::apply_env_overrides(&mut config, env)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; absent sections take their defaults.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Environment map handed to every compute unit.
    ///
    /// Absent values become empty strings; under [`MissingValuePolicy::Fail`]
    /// validation has already rejected that case.
    pub fn table_environment(&self) -> BTreeMap<String, String> {
        let value = |v: &Option<String>| v.clone().unwrap_or_default();
        BTreeMap::from([
            (TABLE_NAME_VAR.to_string(), value(&self.table.name)),
            (PK_NAME_VAR.to_string(), value(&self.table.partition_key_name)),
            (SK_NAME_VAR.to_string(), value(&self.table.sort_key_name)),
        ])
    }
}

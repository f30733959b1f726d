use super::{LogFormat, MissingValuePolicy, StackConfig, PK_NAME_VAR, SK_NAME_VAR, TABLE_NAME_VAR};
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;

pub const ENV_PREFIX: &str = "CLEAN_SERVERLESS_";

/// Abstraction over environment-variable lookups so tests can supply
/// their own source of overrides.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the CLEAN_SERVERLESS_ prefix
    /// Used for the DYNAMO_* variables shared with the handlers
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// In-memory environment keyed by full variable names
#[derive(Debug, Clone, Default)]
pub struct MapEnvSource {
    vars: HashMap<String, String>,
}

impl MapEnvSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl EnvSource for MapEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.get(&format!("{}{}", ENV_PREFIX, key)).cloned()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Apply environment-variable overrides (highest priority) to the stack config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut StackConfig, env: &E) -> Result<()> {
    // Table settings shared with the handler image
    if let Some(name) = get_raw_env_string(env, TABLE_NAME_VAR) {
        config.table.name = Some(name);
    }
    if let Some(pk) = get_raw_env_string(env, PK_NAME_VAR) {
        config.table.partition_key_name = Some(pk);
    }
    if let Some(sk) = get_raw_env_string(env, SK_NAME_VAR) {
        config.table.sort_key_name = Some(sk);
    }
    // An empty value counts as absent, whichever source supplied it
    for value in [
        &mut config.table.name,
        &mut config.table.partition_key_name,
        &mut config.table.sort_key_name,
    ] {
        if value.as_deref() == Some("") {
            *value = None;
        }
    }

    if let Some(policy) = get_env_string(env, "MISSING_VALUES") {
        config.table.missing_values = policy
            .parse::<MissingValuePolicy>()
            .context("Invalid CLEAN_SERVERLESS_MISSING_VALUES value")?;
    }

    // Stack
    if let Some(name) = get_env_string(env, "STACK_NAME") {
        config.stack.name = name;
    }
    if let Some(description) = get_env_string(env, "STACK_DESCRIPTION") {
        config.stack.description = Some(description);
    }

    // API surface
    if let Some(name) = get_env_string(env, "API_NAME") {
        config.api.name = name;
    }
    if let Some(stage) = get_env_string(env, "API_STAGE") {
        config.api.stage = stage;
    }

    // Compute image
    if let Some(dir) = get_env_string(env, "IMAGE_DIR") {
        config.compute.image_dir = dir;
    }
    if let Some(repository) = get_env_string(env, "IMAGE_REPOSITORY") {
        config.compute.image_repository = repository;
    }
    if let Some(prefix) = get_env_string(env, "FUNCTION_PREFIX") {
        config.compute.function_prefix = prefix;
    }

    if let Some(bucket) = get_env_string(env, "BUCKET_NAME") {
        config.bucket.name = bucket;
    }

    if let Some(val) = get_env_bool(env, "SCHEDULE_TABLE_ACCESS")? {
        config.schedule.grant_table_access = val;
    }

    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT") {
        config.logging.format = format
            .parse::<LogFormat>()
            .context("Invalid CLEAN_SERVERLESS_LOG_FORMAT value")?;
    }

    Ok(())
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get(key)
}

/// Get a raw environment variable without the CLEAN_SERVERLESS_ prefix.
/// An empty value counts as absent.
fn get_raw_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get_raw(key).filter(|value| !value.is_empty())
}

fn get_env_bool<E: EnvSource>(env: &E, key: &str) -> Result<Option<bool>> {
    match get_env_string(env, key) {
        Some(val) => {
            let parsed = val.parse::<bool>().map_err(|e| {
                anyhow!(
                    "Failed to parse {}{} (expected bool): {}",
                    ENV_PREFIX,
                    key,
                    e
                )
            })?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &StackConfig) -> Result<()> {
    validate_stack_settings(&config.stack)?;
    validate_table_config(&config.table)?;
    validate_api_config(&config.api)?;
    validate_compute_config(&config.compute)?;

    validate_bucket_name(&config.bucket.name)
        .map_err(|e| anyhow::anyhow!("bucket.name is invalid: {}", e))?;

    if config.logging.level.trim().is_empty() {
        bail!("logging.level must not be empty");
    }

    Ok(())
}

fn validate_stack_settings(stack: &StackSettings) -> Result<()> {
    if stack.name.is_empty() || stack.name.len() > 128 {
        bail!("stack.name must be 1-128 characters");
    }

    let mut chars = stack.name.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if !starts_with_letter || !chars.all(|c| c.is_ascii_alphanumeric() || c == '-') {
        bail!(
            "stack.name '{}' must start with a letter and contain only letters, numbers, and hyphens",
            stack.name
        );
    }

    Ok(())
}

fn validate_table_config(table: &TableConfig) -> Result<()> {
    let values = [
        (TABLE_NAME_VAR, &table.name),
        (PK_NAME_VAR, &table.partition_key_name),
        (SK_NAME_VAR, &table.sort_key_name),
    ];

    let missing: Vec<&str> = values
        .iter()
        .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
        .map(|(var, _)| *var)
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    match table.missing_values {
        MissingValuePolicy::Fail => bail!(
            "missing required table settings: {} (set them in the environment, in [table], \
            or set table.missing_values = \"empty\" to deploy with empty values)",
            missing.join(", ")
        ),
        MissingValuePolicy::Empty => {
            for var in missing {
                warn!(
                    variable = var,
                    "table setting is absent; compute units will receive an empty string"
                );
            }
            Ok(())
        }
    }
}

fn validate_api_config(api: &ApiConfig) -> Result<()> {
    if api.name.trim().is_empty() {
        bail!("api.name must not be empty");
    }

    if api.stage.is_empty() || api.stage.len() > 128 {
        bail!("api.stage must be 1-128 characters");
    }

    if !api
        .stage
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        bail!(
            "api.stage '{}' may only contain letters, numbers, and underscores",
            api.stage
        );
    }

    Ok(())
}

fn validate_compute_config(compute: &ComputeConfig) -> Result<()> {
    if compute.image_dir.trim().is_empty() {
        bail!("compute.image_dir must not be empty");
    }

    let repository = &compute.image_repository;
    if repository.len() < 2 || repository.len() > 256 {
        bail!("compute.image_repository must be 2-256 characters");
    }
    if !repository
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "._/-".contains(c))
    {
        bail!(
            "compute.image_repository '{}' may only contain lowercase letters, numbers, and . _ / -",
            repository
        );
    }

    if !compute
        .function_prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        bail!(
            "compute.function_prefix '{}' may only contain letters, numbers, hyphens, and underscores",
            compute.function_prefix
        );
    }

    Ok(())
}

pub fn validate_bucket_name(input: &str) -> Result<(), String> {
    if input.is_empty() {
        return Err("Bucket name cannot be empty".to_string());
    }
    if input.len() < 3 || input.len() > 63 {
        return Err("Bucket name must be 3-63 characters".to_string());
    }
    if !input
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(
            "Bucket name must contain only lowercase letters, numbers, and hyphens".to_string(),
        );
    }
    if input.starts_with('-') || input.ends_with('-') {
        return Err("Bucket name cannot start or end with a hyphen".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_config() -> StackConfig {
        let mut config = StackConfig::default();
        config.table.name = Some("Orders".to_string());
        config.table.partition_key_name = Some("PK".to_string());
        config.table.sort_key_name = Some("SK".to_string());
        config
    }

    #[test]
    fn test_complete_config_is_valid() {
        assert!(validate_config(&complete_config()).is_ok());
    }

    #[test]
    fn test_missing_table_values_fail_fast() {
        let mut config = complete_config();
        config.table.sort_key_name = None;

        let err = validate_config(&config).unwrap_err().to_string();
        assert!(err.contains("DYNAMO_SK_NAME"));
        assert!(!err.contains("DYNAMO_PK_NAME"));
    }

    #[test]
    fn test_missing_table_values_allowed_with_empty_policy() {
        let mut config = StackConfig::default();
        config.table.missing_values = MissingValuePolicy::Empty;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_stack_name() {
        let mut stack = StackSettings::default();
        assert!(validate_stack_settings(&stack).is_ok());

        stack.name = "1stack".to_string();
        assert!(validate_stack_settings(&stack).is_err());

        stack.name = "my_stack".to_string();
        assert!(validate_stack_settings(&stack).is_err());

        stack.name = "nimble-relay-2847".to_string();
        assert!(validate_stack_settings(&stack).is_ok());
    }

    #[test]
    fn test_validate_api_stage() {
        let mut api = ApiConfig::default();
        assert!(validate_api_config(&api).is_ok());

        api.stage = "dev-1".to_string();
        assert!(validate_api_config(&api).is_err());

        api.stage = String::new();
        assert!(validate_api_config(&api).is_err());
    }

    #[test]
    fn test_validate_compute_config() {
        let mut compute = ComputeConfig::default();
        assert!(validate_compute_config(&compute).is_ok());

        compute.image_repository = "Upper".to_string();
        assert!(validate_compute_config(&compute).is_err());

        compute = ComputeConfig {
            function_prefix: "bad prefix".to_string(),
            ..ComputeConfig::default()
        };
        assert!(validate_compute_config(&compute).is_err());
    }

    #[test]
    fn test_validate_bucket_name() {
        assert!(validate_bucket_name("clean-serverless-book-sample-bucket").is_ok());
        assert!(validate_bucket_name("ab").is_err());
        assert!(validate_bucket_name("Upper-Case").is_err());
        assert!(validate_bucket_name("-leading").is_err());
    }
}

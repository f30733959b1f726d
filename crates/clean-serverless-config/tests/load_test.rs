use clean_serverless_config::{MapEnvSource, MissingValuePolicy, StackConfig};

fn table_env() -> MapEnvSource {
    MapEnvSource::new()
        .with("DYNAMO_TABLE_NAME", "Orders")
        .with("DYNAMO_PK_NAME", "PK")
        .with("DYNAMO_SK_NAME", "SK")
}

#[test]
fn environment_overrides_file_values() {
    let base = StackConfig::from_toml(
        r#"
        [table]
        name = "FromFile"

        [api]
        stage = "staging"
        "#,
    )
    .unwrap();

    let config = StackConfig::load_with_env(base, &table_env()).unwrap();
    assert_eq!(config.table.name.as_deref(), Some("Orders"));
    assert_eq!(config.api.stage, "staging");
}

#[test]
fn missing_table_values_are_rejected_by_default() {
    let err = StackConfig::load_with_env(StackConfig::default(), &MapEnvSource::new())
        .unwrap_err()
        .to_string();

    assert!(err.contains("DYNAMO_TABLE_NAME"));
    assert!(err.contains("DYNAMO_PK_NAME"));
    assert!(err.contains("DYNAMO_SK_NAME"));
}

#[test]
fn empty_policy_substitutes_empty_strings() {
    let env = MapEnvSource::new().with("CLEAN_SERVERLESS_MISSING_VALUES", "empty");
    let config = StackConfig::load_with_env(StackConfig::default(), &env).unwrap();

    assert_eq!(config.table.missing_values, MissingValuePolicy::Empty);
    assert!(config.table_environment().values().all(String::is_empty));
}

#[test]
fn invalid_stage_from_environment_is_rejected() {
    let env = table_env().with("CLEAN_SERVERLESS_API_STAGE", "not a stage");
    assert!(StackConfig::load_with_env(StackConfig::default(), &env).is_err());
}

#[test]
fn empty_table_name_in_file_counts_as_absent() {
    let base = StackConfig::from_toml(
        r#"
        [table]
        name = ""
        missing_values = "empty"
        "#,
    )
    .unwrap();

    let config = StackConfig::load_with_env(base, &MapEnvSource::new()).unwrap();
    assert_eq!(config.table.name, None);
    assert_eq!(config.table_environment()["DYNAMO_TABLE_NAME"], "");
}

#[test]
fn empty_table_name_in_file_is_rejected_by_default() {
    let base = StackConfig::from_toml("[table]\nname = \"\"\n").unwrap();
    let env = MapEnvSource::new()
        .with("DYNAMO_PK_NAME", "PK")
        .with("DYNAMO_SK_NAME", "SK");

    let err = StackConfig::load_with_env(base, &env).unwrap_err().to_string();
    assert!(err.contains("DYNAMO_TABLE_NAME"));
}

#[test]
fn unknown_log_format_from_environment_is_rejected() {
    let env = table_env().with("CLEAN_SERVERLESS_LOG_FORMAT", "xml");
    assert!(StackConfig::load_with_env(StackConfig::default(), &env).is_err());
}

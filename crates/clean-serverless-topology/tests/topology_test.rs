use anyhow::Result;
use clean_serverless_config::{MapEnvSource, StackConfig};
use clean_serverless_topology::model::{BucketEvent, BuildTarget, PolicyResource};
use clean_serverless_topology::{compose, synthesize, HttpMethod, ROUTES, SCHEDULE_HANDLER};
use serde_json::{json, Value};
use std::collections::HashSet;

fn config_from(env: &MapEnvSource) -> Result<StackConfig> {
    StackConfig::load_with_env(StackConfig::default(), env)
}

fn full_env() -> MapEnvSource {
    MapEnvSource::new()
        .with("DYNAMO_TABLE_NAME", "Orders")
        .with("DYNAMO_PK_NAME", "PK")
        .with("DYNAMO_SK_NAME", "SK")
}

fn lenient_env() -> MapEnvSource {
    MapEnvSource::new().with("CLEAN_SERVERLESS_MISSING_VALUES", "empty")
}

#[test]
fn every_route_gets_one_binding_and_its_own_unit() -> Result<()> {
    let topology = compose(&config_from(&full_env())?)?;

    assert_eq!(topology.api.bindings.len(), ROUTES.len());
    for route in &ROUTES {
        let matches: Vec<_> = topology
            .api
            .bindings
            .iter()
            .filter(|b| b.method == route.method && b.path.to_string() == route.path)
            .collect();
        assert_eq!(matches.len(), 1, "{} {}", route.method, route.path);
        assert_eq!(matches[0].unit, route.name);

        let unit = topology.unit(route.name).expect("unit declared");
        assert_eq!(unit.image.target, BuildTarget::Api);
        assert!(unit.is_granted("dynamodb:*"));
        assert!(unit.is_granted("logs:*"));
    }

    let distinct: HashSet<_> = topology.api.bindings.iter().map(|b| &b.unit).collect();
    assert_eq!(distinct.len(), ROUTES.len());

    let template = synthesize(&topology)?.template;
    let methods: Vec<_> = template
        .resources_of_type("AWS::ApiGateway::Method")
        .collect();
    assert_eq!(methods.len(), 11);

    let integrated: HashSet<String> = methods
        .iter()
        .map(|(_, m)| m.properties["Integration"]["Uri"].to_string())
        .collect();
    assert_eq!(integrated.len(), 11);
    assert!(methods
        .iter()
        .all(|(_, m)| m.properties["AuthorizationType"] == json!("NONE")));
    Ok(())
}

#[test]
fn table_has_string_composite_key_and_on_demand_billing() -> Result<()> {
    let template = synthesize(&compose(&config_from(&full_env())?)?)?.template;
    let table = template.resource("ResourceTable").expect("table declared");

    assert_eq!(table.resource_type, "AWS::DynamoDB::Table");
    assert_eq!(
        table.properties["KeySchema"],
        json!([
            { "AttributeName": "PK", "KeyType": "HASH" },
            { "AttributeName": "SK", "KeyType": "RANGE" },
        ])
    );
    assert_eq!(
        table.properties["AttributeDefinitions"],
        json!([
            { "AttributeName": "PK", "AttributeType": "S" },
            { "AttributeName": "SK", "AttributeType": "S" },
        ])
    );
    assert_eq!(table.properties["BillingMode"], json!("PAY_PER_REQUEST"));
    assert_eq!(table.deletion_policy.as_deref(), Some("Delete"));
    assert!(table.properties.get("GlobalSecondaryIndexes").is_none());
    Ok(())
}

#[test]
fn every_unit_receives_the_table_environment() -> Result<()> {
    let topology = compose(&config_from(&full_env())?)?;
    assert_eq!(topology.units.len(), 13);

    for unit in &topology.units {
        let keys: Vec<&str> = unit.environment.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["DYNAMO_PK_NAME", "DYNAMO_SK_NAME", "DYNAMO_TABLE_NAME"]);
        assert_eq!(unit.environment["DYNAMO_TABLE_NAME"], "Orders");
        assert_eq!(unit.environment["DYNAMO_PK_NAME"], "PK");
        assert_eq!(unit.environment["DYNAMO_SK_NAME"], "SK");
        assert_eq!(unit.timeout_secs, 30);
        assert_eq!(unit.memory_mb, 1280);
        assert_eq!(unit.architecture.as_str(), "arm64");
    }
    Ok(())
}

#[test]
fn absent_values_become_empty_strings_when_allowed() -> Result<()> {
    let env = lenient_env().with("DYNAMO_PK_NAME", "PK");
    let topology = compose(&config_from(&env)?)?;

    for unit in &topology.units {
        assert_eq!(unit.environment.len(), 3);
        assert_eq!(unit.environment["DYNAMO_TABLE_NAME"], "");
        assert_eq!(unit.environment["DYNAMO_PK_NAME"], "PK");
        assert_eq!(unit.environment["DYNAMO_SK_NAME"], "");
    }

    let template = synthesize(&topology)?.template;
    let function = template.resource("GetUserFunction").expect("function declared");
    assert_eq!(
        function.properties["Environment"]["Variables"],
        json!({ "DYNAMO_TABLE_NAME": "", "DYNAMO_PK_NAME": "PK", "DYNAMO_SK_NAME": "" })
    );
    Ok(())
}

#[test]
fn absent_values_are_rejected_by_default() {
    let err = config_from(&MapEnvSource::new()).unwrap_err();
    assert!(err.to_string().contains("DYNAMO_TABLE_NAME"));
}

#[test]
fn table_name_follows_environment() -> Result<()> {
    let named = synthesize(&compose(&config_from(&full_env())?)?)?.template;
    assert_eq!(
        named.resource("ResourceTable").map(|t| &t.properties["TableName"]),
        Some(&json!("Orders"))
    );

    let unnamed = synthesize(&compose(&config_from(&lenient_env())?)?)?.template;
    let table = unnamed.resource("ResourceTable").expect("table declared");
    assert!(table.properties.get("TableName").is_none());
    Ok(())
}

#[test]
fn bucket_notifications_share_one_handler() -> Result<()> {
    let topology = compose(&config_from(&full_env())?)?;
    let subscriptions = &topology.bucket.subscriptions;

    assert_eq!(subscriptions.len(), 2);
    let events: HashSet<BucketEvent> = subscriptions.iter().map(|s| s.event).collect();
    assert_eq!(
        events,
        HashSet::from([BucketEvent::ObjectCreated, BucketEvent::ObjectRemoved])
    );
    assert!(subscriptions.iter().all(|s| s.unit == subscriptions[0].unit));

    let handler = topology.unit(&subscriptions[0].unit).expect("handler declared");
    assert_eq!(handler.image.target, BuildTarget::S3Event);
    assert!(handler.is_granted("s3:PutObject"));
    assert!(handler.is_granted("dynamodb:*"));
    assert!(handler.statements.iter().any(|s| s
        .resources
        .contains(&PolicyResource::BucketObjects {
            name: topology.bucket.bucket_name.clone()
        })));

    let template = synthesize(&topology)?.template;
    let bucket = template.resource("Bucket").expect("bucket declared");
    let configurations = bucket.properties["NotificationConfiguration"]["LambdaConfigurations"]
        .as_array()
        .expect("lambda configurations");
    assert_eq!(configurations.len(), 2);
    let functions: HashSet<String> = configurations
        .iter()
        .map(|c| c["Function"].to_string())
        .collect();
    assert_eq!(functions.len(), 1);
    assert_eq!(
        bucket.depends_on,
        vec!["S3HandlerFunctionBucketPermission".to_string()]
    );
    Ok(())
}

#[test]
fn schedule_fires_every_five_minutes_into_one_unit() -> Result<()> {
    let topology = compose(&config_from(&full_env())?)?;
    assert_eq!(topology.schedule.rate_minutes, 5);
    assert_eq!(topology.schedule.target, SCHEDULE_HANDLER);

    let handler = topology.unit(SCHEDULE_HANDLER).expect("handler declared");
    assert_eq!(handler.image.target, BuildTarget::Schedule);
    assert!(handler.statements.is_empty());

    let template = synthesize(&topology)?.template;
    let rules: Vec<_> = template.resources_of_type("AWS::Events::Rule").collect();
    assert_eq!(rules.len(), 1);
    let rule = rules[0].1;
    assert_eq!(rule.properties["ScheduleExpression"], json!("rate(5 minutes)"));
    assert_eq!(
        rule.properties["Targets"],
        json!([{
            "Arn": { "Fn::GetAtt": ["ScheduleHandlerFunction", "Arn"] },
            "Id": "Target0",
        }])
    );

    let permission = template
        .resource("ScheduleRuleScheduleHandlerPermission")
        .expect("events permission");
    assert_eq!(permission.properties["Principal"], json!("events.amazonaws.com"));
    Ok(())
}

#[test]
fn synthesis_is_deterministic() -> Result<()> {
    let render = || -> Result<(String, String)> {
        let synthesized = synthesize(&compose(&config_from(&full_env())?)?)?;
        Ok((
            synthesized.template.to_json()?,
            synthesized.assets.to_json()?,
        ))
    };

    assert_eq!(render()?, render()?);
    Ok(())
}

#[test]
fn template_references_resolve() -> Result<()> {
    let template = synthesize(&compose(&config_from(&full_env())?)?)?.template;
    let document: Value = serde_json::from_str(&template.to_json()?)?;
    let resources = document["Resources"].as_object().expect("resources");

    fn collect<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
        match value {
            Value::Object(map) => {
                if let Some(Value::String(id)) = map.get("Ref") {
                    out.push(id);
                }
                if let Some(Value::Array(parts)) = map.get("Fn::GetAtt") {
                    if let Some(Value::String(id)) = parts.first() {
                        out.push(id);
                    }
                }
                map.values().for_each(|v| collect(v, out));
            }
            Value::Array(items) => items.iter().for_each(|v| collect(v, out)),
            _ => {}
        }
    }

    let mut referenced = Vec::new();
    collect(&document, &mut referenced);
    for id in referenced.into_iter().filter(|id| !id.starts_with("AWS::")) {
        assert!(resources.contains_key(id), "dangling reference to {}", id);
    }

    for (id, resource) in resources {
        if let Some(Value::Array(depends_on)) = resource.get("DependsOn") {
            for dep in depends_on {
                let dep = dep.as_str().expect("string dependency");
                assert!(resources.contains_key(dep), "{} depends on missing {}", id, dep);
            }
        }
    }
    Ok(())
}

#[test]
fn root_method_binds_to_root_resource() -> Result<()> {
    use clean_serverless_topology::{RouteDescriptor, StackComposer};

    const ROUTES: [RouteDescriptor; 1] = [RouteDescriptor {
        name: "health",
        method: HttpMethod::Get,
        path: "/",
    }];
    let config = config_from(&full_env())?;
    let topology = StackComposer::with_routes(&config, &ROUTES).compose()?;
    let template = synthesize(&topology)?.template;

    let method = template.resource("ApiRootGet").expect("root method");
    assert_eq!(
        method.properties["ResourceId"],
        json!({ "Fn::GetAtt": ["Api", "RootResourceId"] })
    );
    assert_eq!(template.resources_of_type("AWS::ApiGateway::Resource").count(), 0);
    Ok(())
}

#[test]
fn empty_table_name_from_file_is_left_to_the_engine() -> Result<()> {
    let base = StackConfig::from_toml("[table]\nname = \"\"\nmissing_values = \"empty\"\n")?;
    let config = StackConfig::load_with_env(base, &MapEnvSource::new())?;
    let template = synthesize(&compose(&config)?)?.template;

    let table = template.resource("ResourceTable").expect("table declared");
    assert!(table.properties.get("TableName").is_none());
    Ok(())
}

#[test]
fn compose_validates_its_configuration() {
    let err = compose(&StackConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        clean_serverless_topology::TopologyError::InvalidConfig { .. }
    ));
}

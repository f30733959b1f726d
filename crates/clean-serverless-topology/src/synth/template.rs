//! CloudFormation rendering of a topology

use super::logical_id;
use crate::error::{Result, TopologyError};
use crate::model::{ComputeUnit, ImageAsset, PolicyResource, PolicyStatement, Topology};
use crate::routes::PathTemplate;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};

const FORMAT_VERSION: &str = "2010-09-09";
const POLICY_VERSION: &str = "2012-10-17";
const BASIC_EXECUTION_POLICY: &str = ":iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, Resource>,
    #[serde(rename = "Outputs")]
    pub outputs: BTreeMap<String, Output>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: String,
    pub properties: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<String>,
}

impl Resource {
    fn new(resource_type: &str, properties: Value) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            properties,
            depends_on: Vec::new(),
            deletion_policy: None,
            update_replace_policy: None,
        }
    }

    fn depends_on(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.depends_on.extend(ids);
        self.depends_on.sort();
        self.depends_on.dedup();
        self
    }

    fn removal(mut self, policy: &str) -> Self {
        self.deletion_policy = Some(policy.to_string());
        self.update_replace_policy = Some(policy.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub description: String,
    pub value: Value,
}

impl Template {
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Resource)> + 'a {
        self.resources
            .iter()
            .filter(move |(_, r)| r.resource_type == resource_type)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn reference(id: &str) -> Value {
    json!({ "Ref": id })
}

fn get_att(id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [id, attribute] })
}

fn join(parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": ["", parts] })
}

fn partition_arn(rest: Vec<Value>) -> Value {
    let mut parts = vec![json!("arn:"), reference("AWS::Partition")];
    parts.extend(rest);
    join(parts)
}

/// Image URI in the stack's account and region, tagged with the build fingerprint
pub fn image_uri(image: &ImageAsset) -> String {
    format!(
        "${{AWS::AccountId}}.dkr.ecr.${{AWS::Region}}.${{AWS::URLSuffix}}/{}:{}",
        image.repository,
        image.fingerprint()
    )
}

/// Renders declarations in composition order, refusing ID collisions.
struct TemplateBuilder<'a> {
    topology: &'a Topology,
    resources: BTreeMap<String, Resource>,
}

impl<'a> TemplateBuilder<'a> {
    fn add(&mut self, id: String, resource: Resource) -> Result<()> {
        if self.resources.contains_key(&id) {
            return Err(TopologyError::LogicalIdCollision { id });
        }
        self.resources.insert(id, resource);
        Ok(())
    }

    fn unit(&self, owner: &str, name: &str) -> Result<&'a ComputeUnit> {
        let topology: &'a Topology = self.topology;
        topology
            .unit(name)
            .ok_or_else(|| TopologyError::UnknownUnit {
                owner: owner.to_string(),
                unit: name.to_string(),
            })
    }

    fn table(&mut self) -> Result<()> {
        let topology = self.topology;
        let table = &topology.table;
        let keys = [
            (&table.partition_key, "HASH"),
            (&table.sort_key, "RANGE"),
        ];

        let mut properties = json!({
            "KeySchema": keys
                .iter()
                .map(|(key, kind)| json!({ "AttributeName": key.name, "KeyType": kind }))
                .collect::<Vec<_>>(),
            "AttributeDefinitions": keys
                .iter()
                .map(|(key, _)| json!({
                    "AttributeName": key.name,
                    "AttributeType": key.attribute_type.code(),
                }))
                .collect::<Vec<_>>(),
            "BillingMode": table.billing_mode.as_str(),
        });
        if let Some(name) = &table.table_name {
            properties["TableName"] = json!(name);
        }

        let resource = Resource::new("AWS::DynamoDB::Table", properties)
            .removal(table.removal_policy.as_policy());
        self.add(table.logical_id.clone(), resource)
    }

    fn units(&mut self) -> Result<()> {
        let topology = self.topology;
        for unit in &topology.units {
            let role_id = logical_id::role(&unit.name);
            let policy_id = logical_id::policy(&unit.name);

            let role = Resource::new(
                "AWS::IAM::Role",
                json!({
                    "AssumeRolePolicyDocument": {
                        "Version": POLICY_VERSION,
                        "Statement": [{
                            "Action": "sts:AssumeRole",
                            "Effect": "Allow",
                            "Principal": { "Service": "lambda.amazonaws.com" },
                        }],
                    },
                    "ManagedPolicyArns": [partition_arn(vec![json!(BASIC_EXECUTION_POLICY)])],
                }),
            );
            self.add(role_id.clone(), role)?;

            let mut depends_on = vec![role_id.clone()];
            if !unit.statements.is_empty() {
                let statements: Vec<Value> =
                    unit.statements.iter().map(render_statement).collect();
                let policy = Resource::new(
                    "AWS::IAM::Policy",
                    json!({
                        "PolicyName": policy_id,
                        "PolicyDocument": {
                            "Version": POLICY_VERSION,
                            "Statement": statements,
                        },
                        "Roles": [reference(&role_id)],
                    }),
                );
                self.add(policy_id.clone(), policy)?;
                depends_on.push(policy_id);
            }

            let function = Resource::new(
                "AWS::Lambda::Function",
                json!({
                    "FunctionName": unit.function_name,
                    "PackageType": "Image",
                    "Code": { "ImageUri": { "Fn::Sub": image_uri(&unit.image) } },
                    "Architectures": [unit.architecture.as_str()],
                    "Timeout": unit.timeout_secs,
                    "MemorySize": unit.memory_mb,
                    "Role": get_att(&role_id, "Arn"),
                    "Environment": { "Variables": unit.environment },
                }),
            )
            .depends_on(depends_on);
            self.add(logical_id::function(&unit.name), function)?;
        }
        Ok(())
    }

    fn api(&mut self) -> Result<String> {
        let topology = self.topology;
        let api = &topology.api;
        let api_id = api.logical_id.as_str();

        self.add(
            api_id.to_string(),
            Resource::new("AWS::ApiGateway::RestApi", json!({ "Name": api.name })),
        )?;

        for path in api.resources() {
            let (Some(parent), Some(last)) = (path.parent(), path.last()) else {
                continue;
            };
            let resource = Resource::new(
                "AWS::ApiGateway::Resource",
                json!({
                    "ParentId": parent_resource(api_id, &parent),
                    "PathPart": last.to_string(),
                    "RestApiId": reference(api_id),
                }),
            );
            self.add(logical_id::path_resource(api_id, &path), resource)?;
        }

        let mut method_ids = Vec::with_capacity(api.bindings.len());
        for binding in &api.bindings {
            let owner = format!("Endpoint {} {}", binding.method, binding.path);
            let unit = self.unit(&owner, &binding.unit)?;
            let function_arn = get_att(&logical_id::function(&unit.name), "Arn");
            let method_id = logical_id::method(api_id, &binding.path, binding.method);

            let method = Resource::new(
                "AWS::ApiGateway::Method",
                json!({
                    "HttpMethod": binding.method.as_str(),
                    "ResourceId": parent_resource(api_id, &binding.path),
                    "RestApiId": reference(api_id),
                    "AuthorizationType": "NONE",
                    "Integration": {
                        "Type": "AWS_PROXY",
                        "IntegrationHttpMethod": "POST",
                        "Uri": partition_arn(vec![
                            json!(":apigateway:"),
                            reference("AWS::Region"),
                            json!(":lambda:path/2015-03-31/functions/"),
                            function_arn.clone(),
                            json!("/invocations"),
                        ]),
                    },
                }),
            );
            self.add(method_id.clone(), method)?;

            let permission = Resource::new(
                "AWS::Lambda::Permission",
                json!({
                    "Action": "lambda:InvokeFunction",
                    "FunctionName": function_arn,
                    "Principal": "apigateway.amazonaws.com",
                    "SourceArn": partition_arn(vec![
                        json!(":execute-api:"),
                        reference("AWS::Region"),
                        json!(":"),
                        reference("AWS::AccountId"),
                        json!(":"),
                        reference(api_id),
                        json!(format!("/*/{}{}", binding.method, binding.path.wildcard())),
                    ]),
                }),
            );
            self.add(logical_id::api_permission(&method_id), permission)?;
            method_ids.push(method_id);
        }

        // A deployment is immutable; a new ID per binding set forces redeployment.
        let deployment_id = format!("{}Deployment{}", api_id, bindings_digest(&method_ids));
        let deployment = Resource::new(
            "AWS::ApiGateway::Deployment",
            json!({
                "RestApiId": reference(api_id),
                "Description": format!("{} endpoints", method_ids.len()),
            }),
        )
        .depends_on(method_ids);
        self.add(deployment_id.clone(), deployment)?;

        let stage_id = logical_id::stage(api_id, &api.stage);
        let stage = Resource::new(
            "AWS::ApiGateway::Stage",
            json!({
                "RestApiId": reference(api_id),
                "DeploymentId": reference(&deployment_id),
                "StageName": api.stage,
            }),
        );
        self.add(stage_id.clone(), stage)?;
        Ok(stage_id)
    }

    fn bucket(&mut self) -> Result<()> {
        let topology = self.topology;
        let bucket = &topology.bucket;
        let bucket_arn = partition_arn(vec![json!(":s3:::"), json!(bucket.bucket_name)]);

        let mut configurations = Vec::new();
        let mut permissions = BTreeSet::new();
        for subscription in &bucket.subscriptions {
            let owner = format!("Bucket notification {}", subscription.event.s3_event());
            let unit = self.unit(&owner, &subscription.unit)?;
            let function_arn = get_att(&logical_id::function(&unit.name), "Arn");
            configurations.push(json!({
                "Event": subscription.event.s3_event(),
                "Function": function_arn,
            }));

            let permission_id = logical_id::bucket_permission(&unit.name);
            if permissions.insert(permission_id.clone()) {
                let permission = Resource::new(
                    "AWS::Lambda::Permission",
                    json!({
                        "Action": "lambda:InvokeFunction",
                        "FunctionName": function_arn,
                        "Principal": "s3.amazonaws.com",
                        "SourceAccount": reference("AWS::AccountId"),
                        "SourceArn": bucket_arn.clone(),
                    }),
                );
                self.add(permission_id, permission)?;
            }
        }

        let resource = Resource::new(
            "AWS::S3::Bucket",
            json!({
                "BucketName": bucket.bucket_name,
                "NotificationConfiguration": { "LambdaConfigurations": configurations },
            }),
        )
        .depends_on(permissions)
        .removal(bucket.removal_policy.as_policy());
        self.add(bucket.logical_id.clone(), resource)
    }

    fn schedule(&mut self) -> Result<()> {
        let topology = self.topology;
        let schedule = &topology.schedule;
        let unit = self.unit("Schedule", &schedule.target)?;
        let function_arn = get_att(&logical_id::function(&unit.name), "Arn");

        let rule = Resource::new(
            "AWS::Events::Rule",
            json!({
                "ScheduleExpression": schedule.expression(),
                "State": "ENABLED",
                "Targets": [{ "Arn": function_arn.clone(), "Id": "Target0" }],
            }),
        );
        self.add(schedule.logical_id.clone(), rule)?;

        let permission = Resource::new(
            "AWS::Lambda::Permission",
            json!({
                "Action": "lambda:InvokeFunction",
                "FunctionName": function_arn,
                "Principal": "events.amazonaws.com",
                "SourceArn": get_att(&schedule.logical_id, "Arn"),
            }),
        );
        self.add(
            logical_id::schedule_permission(&schedule.logical_id, &unit.name),
            permission,
        )
    }
}

fn parent_resource(api_id: &str, path: &PathTemplate) -> Value {
    if path.is_root() {
        get_att(api_id, "RootResourceId")
    } else {
        reference(&logical_id::path_resource(api_id, path))
    }
}

fn bindings_digest(method_ids: &[String]) -> String {
    let mut sorted: Vec<&str> = method_ids.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let hash = blake3::hash(sorted.join(",").as_bytes());
    hash.to_hex().as_str()[..8].to_string()
}

// Buckets are addressed by literal name rather than `Ref` so a handler's
// policy does not depend on the bucket that depends on the handler.
fn render_resource(resource: &PolicyResource) -> Value {
    match resource {
        PolicyResource::Any => json!("*"),
        PolicyResource::Table { logical_id } => get_att(logical_id, "Arn"),
        PolicyResource::TableIndexes { logical_id } => {
            join(vec![get_att(logical_id, "Arn"), json!("/index/*")])
        }
        PolicyResource::Bucket { name } => partition_arn(vec![json!(":s3:::"), json!(name)]),
        PolicyResource::BucketObjects { name } => {
            partition_arn(vec![json!(":s3:::"), json!(format!("{}/*", name))])
        }
    }
}

fn render_statement(statement: &PolicyStatement) -> Value {
    let resources: Vec<Value> = statement.resources.iter().map(render_resource).collect();
    json!({
        "Effect": statement.effect.as_str(),
        "Action": statement.actions,
        "Resource": resources,
    })
}

fn outputs(topology: &Topology, stage_id: &str) -> BTreeMap<String, Output> {
    let api_id = topology.api.logical_id.as_str();
    BTreeMap::from([
        (
            "ApiEndpoint".to_string(),
            Output {
                description: format!("Invoke URL of the {} stage", topology.api.stage),
                value: join(vec![
                    json!("https://"),
                    reference(api_id),
                    json!(".execute-api."),
                    reference("AWS::Region"),
                    json!("."),
                    reference("AWS::URLSuffix"),
                    json!("/"),
                    reference(stage_id),
                    json!("/"),
                ]),
            },
        ),
        (
            "TableName".to_string(),
            Output {
                description: "Name of the record table".to_string(),
                value: reference(&topology.table.logical_id),
            },
        ),
        (
            "BucketName".to_string(),
            Output {
                description: "Name of the notification bucket".to_string(),
                value: reference(&topology.bucket.logical_id),
            },
        ),
    ])
}

/// Render the topology as a CloudFormation template
pub fn render(topology: &Topology) -> Result<Template> {
    let mut builder = TemplateBuilder {
        topology,
        resources: BTreeMap::new(),
    };

    builder.table()?;
    builder.units()?;
    let stage_id = builder.api()?;
    builder.bucket()?;
    builder.schedule()?;

    Ok(Template {
        format_version: FORMAT_VERSION.to_string(),
        description: topology.description.clone(),
        resources: builder.resources,
        outputs: outputs(topology, &stage_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::compose;
    use clean_serverless_config::{MissingValuePolicy, StackConfig};

    fn template() -> Template {
        let mut config = StackConfig::default();
        config.table.missing_values = MissingValuePolicy::Empty;
        render(&compose(&config).unwrap()).unwrap()
    }

    #[test]
    fn table_without_name_leaves_naming_to_engine() {
        let template = template();
        let table = template.resource("ResourceTable").unwrap();
        assert!(table.properties.get("TableName").is_none());
        assert_eq!(table.deletion_policy.as_deref(), Some("Delete"));
    }

    #[test]
    fn intermediate_resources_chain_to_root() {
        let template = template();
        let v1 = template.resource("ApiV1").unwrap();
        assert_eq!(
            v1.properties["ParentId"],
            json!({ "Fn::GetAtt": ["Api", "RootResourceId"] })
        );
        let users = template.resource("ApiV1Users").unwrap();
        assert_eq!(users.properties["ParentId"], json!({ "Ref": "ApiV1" }));
        assert_eq!(
            template.resource("ApiV1UsersUserId").unwrap().properties["PathPart"],
            json!("{user_id}")
        );
    }

    #[test]
    fn invoke_permission_uses_wildcard_path() {
        let template = template();
        let permission = template
            .resource("ApiV1UsersUserIdMicropostsMicropostIdGetApiPermission")
            .unwrap();
        let parts = &permission.properties["SourceArn"]["Fn::Join"][1];
        let last = parts.as_array().unwrap().last().unwrap();
        assert_eq!(last, &json!("/*/GET/v1/users/*/microposts/*"));
    }

    #[test]
    fn policy_only_emitted_for_units_with_grants() {
        let template = template();
        assert!(template.resource("GetUserFunctionServiceRoleDefaultPolicy").is_some());
        assert!(template
            .resource("ScheduleHandlerFunctionServiceRoleDefaultPolicy")
            .is_none());
        assert_eq!(
            template.resource("ScheduleHandlerFunction").unwrap().depends_on,
            vec!["ScheduleHandlerFunctionServiceRole".to_string()]
        );
    }

    #[test]
    fn colliding_logical_ids_are_rejected() {
        let mut config = StackConfig::default();
        config.table.missing_values = MissingValuePolicy::Empty;
        let mut topology = compose(&config).unwrap();
        // "get_user" and "getUser" both map to GetUserFunction
        let mut clone = topology.unit("getUser").unwrap().clone();
        clone.name = "get_user".to_string();
        topology.units.push(clone);

        assert_eq!(
            render(&topology).unwrap_err(),
            TopologyError::LogicalIdCollision {
                id: "GetUserFunctionServiceRole".to_string()
            }
        );
    }

    #[test]
    fn deployment_depends_on_every_method() {
        let template = template();
        let deployments: Vec<_> = template
            .resources_of_type("AWS::ApiGateway::Deployment")
            .collect();
        assert_eq!(deployments.len(), 1);
        assert_eq!(deployments[0].1.depends_on.len(), 11);
    }
}

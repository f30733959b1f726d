//! Logical IDs for template resources, derived from declaration names

use crate::routes::{HttpMethod, PathTemplate};

/// `getUser` -> `GetUser`, `user_id` -> `UserId`, `s3Handler` -> `S3Handler`
pub fn pascal(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

pub fn function(unit: &str) -> String {
    format!("{}Function", pascal(unit))
}

pub fn role(unit: &str) -> String {
    format!("{}ServiceRole", function(unit))
}

pub fn policy(unit: &str) -> String {
    format!("{}DefaultPolicy", role(unit))
}

/// `Api` + `/v1/users/{user_id}` -> `ApiV1UsersUserId`; the root maps to `ApiRoot`.
pub fn path_resource(api_id: &str, path: &PathTemplate) -> String {
    if path.is_root() {
        return format!("{}Root", api_id);
    }
    let mut id = api_id.to_string();
    for segment in path.segments() {
        id.push_str(&pascal(segment.name()));
    }
    id
}

pub fn method(api_id: &str, path: &PathTemplate, method: HttpMethod) -> String {
    format!(
        "{}{}",
        path_resource(api_id, path),
        pascal(&method.as_str().to_ascii_lowercase())
    )
}

pub fn api_permission(method_id: &str) -> String {
    format!("{}ApiPermission", method_id)
}

pub fn bucket_permission(unit: &str) -> String {
    format!("{}BucketPermission", function(unit))
}

pub fn schedule_permission(rule_id: &str, unit: &str) -> String {
    format!("{}{}Permission", rule_id, pascal(unit))
}

pub fn stage(api_id: &str, stage: &str) -> String {
    format!("{}DeploymentStage{}", api_id, pascal(stage))
}

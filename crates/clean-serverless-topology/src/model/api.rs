use crate::routes::{HttpMethod, PathTemplate};
use serde::Serialize;
use std::collections::BTreeSet;

/// Immutable `(method, path, unit)` triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointBinding {
    pub method: HttpMethod,
    pub path: PathTemplate,
    pub unit: String,
}

/// REST entry point with one deployment stage. No authorizer, request
/// validation or throttling is declared on any route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestApiDecl {
    pub logical_id: String,
    pub name: String,
    pub stage: String,
    pub bindings: Vec<EndpointBinding>,
}

impl RestApiDecl {
    pub fn new(name: &str, stage: &str) -> Self {
        Self {
            logical_id: "Api".to_string(),
            name: name.to_string(),
            stage: stage.to_string(),
            bindings: Vec::new(),
        }
    }

    pub fn bind(&mut self, method: HttpMethod, path: PathTemplate, unit: &str) {
        self.bindings.push(EndpointBinding {
            method,
            path,
            unit: unit.to_string(),
        });
    }

    /// Every path resource the surface needs, intermediate ones included
    pub fn resources(&self) -> BTreeSet<PathTemplate> {
        self.bindings
            .iter()
            .flat_map(|b| b.path.prefixes())
            .collect()
    }

    pub fn binding(&self, method: HttpMethod, path: &str) -> Option<&EndpointBinding> {
        self.bindings
            .iter()
            .find(|b| b.method == method && b.path.to_string() == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resources_include_intermediate_paths() {
        let mut api = RestApiDecl::new("Sample", "dev");
        api.bind(
            HttpMethod::Get,
            PathTemplate::parse("/v1/users/{user_id}").unwrap(),
            "getUser",
        );
        api.bind(
            HttpMethod::Post,
            PathTemplate::parse("/v1/hello").unwrap(),
            "hello",
        );

        let resources: Vec<String> = api.resources().iter().map(|p| p.to_string()).collect();
        assert_eq!(
            resources,
            vec!["/v1", "/v1/hello", "/v1/users", "/v1/users/{user_id}"]
        );
        assert_eq!(
            api.binding(HttpMethod::Get, "/v1/users/{user_id}").unwrap().unit,
            "getUser"
        );
        assert!(api.binding(HttpMethod::Put, "/v1/users/{user_id}").is_none());
    }
}

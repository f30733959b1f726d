// Structural checks run once a topology is composed, so malformed
// declarations fail at synthesis time instead of at deploy time.

use crate::error::{Result, TopologyError};
use crate::model::Topology;
use crate::routes::{PathSegment, PathTemplate};
use std::collections::{BTreeMap, HashSet};

const MAX_FUNCTION_NAME_LEN: usize = 64;

impl Topology {
    pub fn validate(&self) -> Result<()> {
        self.validate_units()?;
        self.validate_bindings()?;
        validate_path_parameters(self.api.resources().iter())?;
        self.validate_references()?;
        Ok(())
    }

    fn validate_units(&self) -> Result<()> {
        let mut names = HashSet::new();
        for unit in &self.units {
            if !names.insert(unit.name.as_str()) {
                return Err(TopologyError::DuplicateUnit {
                    name: unit.name.clone(),
                });
            }
            validate_function_name(&unit.function_name)?;
        }
        Ok(())
    }

    fn validate_bindings(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for binding in &self.api.bindings {
            if !seen.insert((binding.method, &binding.path)) {
                return Err(TopologyError::DuplicateBinding {
                    method: binding.method.to_string(),
                    path: binding.path.to_string(),
                });
            }
        }
        Ok(())
    }

    fn validate_references(&self) -> Result<()> {
        let owners = self
            .api
            .bindings
            .iter()
            .map(|b| (format!("Endpoint {} {}", b.method, b.path), &b.unit))
            .chain(self.bucket.subscriptions.iter().map(|s| {
                (
                    format!("Bucket notification {}", s.event.s3_event()),
                    &s.unit,
                )
            }))
            .chain(std::iter::once((
                "Schedule".to_string(),
                &self.schedule.target,
            )));

        for (owner, unit) in owners {
            if self.unit(unit).is_none() {
                return Err(TopologyError::UnknownUnit {
                    owner,
                    unit: unit.clone(),
                });
            }
        }
        Ok(())
    }
}

fn validate_function_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| TopologyError::InvalidFunctionName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.len() > MAX_FUNCTION_NAME_LEN {
        return Err(invalid("must be at most 64 characters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(invalid("may only contain letters, numbers, hyphens, and underscores"));
    }
    Ok(())
}

/// Sibling parameters under one parent must share a name, otherwise the
/// API layer cannot tell which placeholder a request matched.
fn validate_path_parameters<'a>(resources: impl Iterator<Item = &'a PathTemplate>) -> Result<()> {
    let mut params_by_parent: BTreeMap<String, &str> = BTreeMap::new();

    for resource in resources {
        let Some(PathSegment::Param(name)) = resource.last() else {
            continue;
        };
        let parent = resource
            .parent()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "/".to_string());

        match params_by_parent.get(&parent) {
            Some(existing) if *existing != name.as_str() => {
                return Err(TopologyError::ConflictingPathParameter {
                    parent,
                    existing: existing.to_string(),
                    conflicting: name.clone(),
                });
            }
            Some(_) => {}
            None => {
                params_by_parent.insert(parent, name);
            }
        }
    }
    Ok(())
}

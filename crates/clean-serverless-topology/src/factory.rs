//! Compute Factory: one shared image definition, one unit per build target
//! and logical name.

use crate::model::{Architecture, BuildTarget, ComputeUnit, ImageAsset, MEMORY_MB, TIMEOUT_SECS};
use clean_serverless_config::{ComputeConfig, StackConfig};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ComputeFactory {
    image_dir: String,
    image_repository: String,
    function_prefix: String,
    environment: BTreeMap<String, String>,
}

impl ComputeFactory {
    pub fn new(
        image_dir: impl Into<String>,
        function_prefix: impl Into<String>,
        environment: BTreeMap<String, String>,
    ) -> Self {
        Self {
            image_dir: image_dir.into(),
            image_repository: ComputeConfig::default().image_repository,
            function_prefix: function_prefix.into(),
            environment,
        }
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.image_repository = repository.into();
        self
    }

    pub fn from_config(config: &StackConfig) -> Self {
        Self::new(
            config.compute.image_dir.clone(),
            config.compute.function_prefix.clone(),
            config.table_environment(),
        )
        .with_repository(config.compute.image_repository.clone())
    }

    /// Build a unit with the fixed limits and the table environment.
    ///
    /// The returned unit has no grants beyond basic log writing.
    pub fn create(&self, target: BuildTarget, name: &str) -> ComputeUnit {
        let architecture = Architecture::Arm64;
        let unit = ComputeUnit {
            name: name.to_string(),
            function_name: format!("{}{}", self.function_prefix, name),
            image: ImageAsset {
                directory: self.image_dir.clone(),
                target,
                platform: architecture.docker_platform(),
                repository: self.image_repository.clone(),
            },
            architecture,
            timeout_secs: TIMEOUT_SECS,
            memory_mb: MEMORY_MB,
            environment: self.environment.clone(),
            statements: Vec::new(),
        };
        debug!(unit = name, %target, function = %unit.function_name, "Created compute unit");
        unit
    }
}

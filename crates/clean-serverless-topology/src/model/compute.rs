use super::policy::PolicyStatement;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Timeout applied to every compute unit
pub const TIMEOUT_SECS: u64 = 30;
/// Memory applied to every compute unit
pub const MEMORY_MB: u32 = 1280;

/// Stage of the shared multi-stage image build that selects a unit's behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildTarget {
    Api,
    S3Event,
    Schedule,
}

impl BuildTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildTarget::Api => "api",
            BuildTarget::S3Event => "s3event",
            BuildTarget::Schedule => "schedule",
        }
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Arm64,
}

impl Architecture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Arm64 => "arm64",
        }
    }

    /// Docker `--platform` the image must be built for
    pub fn docker_platform(&self) -> &'static str {
        match self {
            Architecture::Arm64 => "linux/arm64",
        }
    }
}

/// Container image built from a directory at a given target and pushed to
/// `repository`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageAsset {
    pub directory: String,
    pub target: BuildTarget,
    pub platform: &'static str,
    pub repository: String,
}

impl ImageAsset {
    /// Stable identity of the build; identical builds share one image.
    /// The destination repository is not part of the identity.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for part in [self.directory.as_str(), self.target.as_str(), self.platform] {
            hasher.update(part.as_bytes());
            hasher.update(&[0]);
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// One independently invocable, stateless unit of packaged logic.
///
/// Every unit's role also carries the basic log-write execution policy;
/// `statements` lists what is granted on top of that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputeUnit {
    pub name: String,
    pub function_name: String,
    pub image: ImageAsset,
    pub architecture: Architecture,
    pub timeout_secs: u64,
    pub memory_mb: u32,
    pub environment: BTreeMap<String, String>,
    pub statements: Vec<PolicyStatement>,
}

impl ComputeUnit {
    pub fn grant(&mut self, statement: PolicyStatement) {
        self.statements.push(statement);
    }

    pub fn is_granted(&self, action: &str) -> bool {
        self.statements.iter().any(|s| s.grants(action))
    }
}

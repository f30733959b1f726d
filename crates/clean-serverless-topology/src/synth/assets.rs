//! Container image assets the template expects to find in the registry

use super::template::image_uri;
use crate::model::Topology;
use serde::Serialize;
use std::collections::BTreeMap;

const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerImageAsset {
    pub directory: String,
    pub target: String,
    pub platform: String,
    pub repository: String,
    pub tag: String,
    /// `Fn::Sub` string the functions reference
    pub image_uri: String,
    /// Units running this image
    pub units: Vec<String>,
}

impl DockerImageAsset {
    /// Local build command producing the tagged image
    pub fn build_command(&self) -> String {
        format!(
            "docker build --platform {} --target {} -t {}:{} {}",
            self.platform, self.target, self.repository, self.tag, self.directory
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetManifest {
    pub version: u32,
    pub docker_images: BTreeMap<String, DockerImageAsset>,
}

impl AssetManifest {
    /// One entry per distinct build; units sharing a build share the entry.
    pub fn from_topology(topology: &Topology) -> Self {
        let mut docker_images: BTreeMap<String, DockerImageAsset> = BTreeMap::new();

        for unit in &topology.units {
            let fingerprint = unit.image.fingerprint();
            docker_images
                .entry(fingerprint.clone())
                .or_insert_with(|| DockerImageAsset {
                    directory: unit.image.directory.clone(),
                    target: unit.image.target.to_string(),
                    platform: unit.image.platform.to_string(),
                    repository: unit.image.repository.clone(),
                    tag: fingerprint,
                    image_uri: image_uri(&unit.image),
                    units: Vec::new(),
                })
                .units
                .push(unit.name.clone());
        }

        for asset in docker_images.values_mut() {
            asset.units.sort();
        }

        Self {
            version: MANIFEST_VERSION,
            docker_images,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

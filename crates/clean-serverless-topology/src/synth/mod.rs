//! Synthesis of a topology into deployable artifacts

mod assets;
pub mod logical_id;
mod template;

pub use assets::{AssetManifest, DockerImageAsset};
pub use template::{image_uri, render, Output, Resource, Template};

use crate::error::Result;
use crate::model::Topology;
use tracing::info;

/// Template and asset manifest for one topology
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesized {
    pub template: Template,
    pub assets: AssetManifest,
}

impl Synthesized {
    pub fn template_file_name(stack_name: &str) -> String {
        format!("{}.template.json", stack_name)
    }
}

pub const ASSETS_FILE_NAME: &str = "assets.json";

pub fn synthesize(topology: &Topology) -> Result<Synthesized> {
    let template = render(topology)?;
    let assets = AssetManifest::from_topology(topology);
    info!(
        resources = template.resources.len(),
        images = assets.docker_images.len(),
        "Synthesized template"
    );
    Ok(Synthesized { template, assets })
}

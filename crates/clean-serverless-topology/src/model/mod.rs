//! Resource declarations making up a topology
//!
//! Everything here is created once while the topology is composed and never
//! mutated afterwards.

mod api;
mod bucket;
mod compute;
mod policy;
mod schedule;
mod table;

pub use api::{EndpointBinding, RestApiDecl};
pub use bucket::{BucketDecl, BucketEvent, NotificationSubscription};
pub use compute::{Architecture, BuildTarget, ComputeUnit, ImageAsset, MEMORY_MB, TIMEOUT_SECS};
pub use policy::{Effect, PolicyResource, PolicyStatement};
pub use schedule::{ScheduleDecl, SCHEDULE_RATE_MINUTES};
pub use table::{
    AttributeType, BillingMode, KeyAttribute, RemovalPolicy, TableDecl, PARTITION_KEY, SORT_KEY,
};

use serde::Serialize;

/// The full set of declared resources and their relationships
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topology {
    pub stack_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub table: TableDecl,
    pub api: RestApiDecl,
    pub units: Vec<ComputeUnit>,
    pub bucket: BucketDecl,
    pub schedule: ScheduleDecl,
}

impl Topology {
    pub fn unit(&self, name: &str) -> Option<&ComputeUnit> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Units bound to API routes, in route-table order
    pub fn api_units(&self) -> impl Iterator<Item = &ComputeUnit> {
        self.api
            .bindings
            .iter()
            .filter_map(|binding| self.unit(&binding.unit))
    }

    /// Distinct image builds, keyed by fingerprint
    pub fn images(&self) -> std::collections::BTreeMap<String, &ImageAsset> {
        self.units
            .iter()
            .map(|u| (u.image.fingerprint(), &u.image))
            .collect()
    }
}

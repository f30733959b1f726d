//! Resource topology for the clean-serverless sample stack.
//!
//! A [`StackComposer`] turns a validated [`StackConfig`] into a typed
//! [`Topology`]: one record table, a REST API whose static route table maps
//! each route to its own compute unit, a bucket whose object notifications
//! feed one handler, and a fixed-rate schedule feeding another. The
//! [`synth`] module renders that topology as a CloudFormation template plus
//! the container images it expects.
//!
//! [`StackConfig`]: clean_serverless_config::StackConfig

pub mod composer;
pub mod error;
pub mod factory;
pub mod model;
pub mod routes;
pub mod synth;
mod validate;

pub use composer::{compose, StackComposer, BUCKET_HANDLER, SCHEDULE_HANDLER};
pub use error::{Result, TopologyError};
pub use factory::ComputeFactory;
pub use model::Topology;
pub use routes::{HttpMethod, PathTemplate, RouteDescriptor, ROUTES};
pub use synth::{synthesize, AssetManifest, Synthesized, Template};

//! Stack Composer
//!
//! Builds the topology in a fixed order: table, API surface and its
//! endpoints, bucket and its handler, schedule and its handler. Each step
//! only appends declarations; nothing declared earlier is modified.

use crate::error::{Result, TopologyError};
use crate::factory::ComputeFactory;
use crate::model::{
    BucketDecl, BucketEvent, BuildTarget, ComputeUnit, PolicyStatement, RestApiDecl,
    ScheduleDecl, TableDecl, Topology, PARTITION_KEY, SCHEDULE_RATE_MINUTES, SORT_KEY,
};
use crate::routes::{PathTemplate, RouteDescriptor, ROUTES};
use clean_serverless_config::StackConfig;
use tracing::{debug, info, warn};

/// Logical name of the unit handling bucket notifications
pub const BUCKET_HANDLER: &str = "s3Handler";
/// Logical name of the unit invoked by the timer
pub const SCHEDULE_HANDLER: &str = "scheduleHandler";

pub struct StackComposer<'a> {
    config: &'a StackConfig,
    factory: ComputeFactory,
    routes: &'a [RouteDescriptor],
}

impl<'a> StackComposer<'a> {
    pub fn new(config: &'a StackConfig) -> Self {
        Self::with_routes(config, &ROUTES)
    }

    /// Compose against a custom route table
    pub fn with_routes(config: &'a StackConfig, routes: &'a [RouteDescriptor]) -> Self {
        Self {
            config,
            factory: ComputeFactory::from_config(config),
            routes,
        }
    }

    /// Compose the topology.
    ///
    /// The configuration is taken as already validated; use [`compose`] to
    /// validate and compose in one step.
    pub fn compose(&self) -> Result<Topology> {
        info!(stack = %self.config.stack.name, "Composing topology");

        let table = self.table();
        let (api, mut units) = self.api_surface(&table)?;
        let (bucket, bucket_handler) = self.bucket(&table);
        let (schedule, schedule_handler) = self.schedule(&table);
        units.push(bucket_handler);
        units.push(schedule_handler);

        let topology = Topology {
            stack_name: self.config.stack.name.clone(),
            description: self.config.stack.description.clone(),
            table,
            api,
            units,
            bucket,
            schedule,
        };
        topology.validate()?;

        info!(
            units = topology.units.len(),
            endpoints = topology.api.bindings.len(),
            "Topology composed"
        );
        Ok(topology)
    }

    fn table(&self) -> TableDecl {
        let table_config = &self.config.table;
        for (var, configured, declared) in [
            ("DYNAMO_PK_NAME", &table_config.partition_key_name, PARTITION_KEY),
            ("DYNAMO_SK_NAME", &table_config.sort_key_name, SORT_KEY),
        ] {
            if let Some(configured) = configured {
                if configured != declared {
                    warn!(
                        variable = var,
                        configured = %configured,
                        declared,
                        "key name handed to compute units differs from the declared key attribute"
                    );
                }
            }
        }

        let table = TableDecl::new(table_config.name.clone());
        debug!(
            table_name = table.table_name.as_deref().unwrap_or("<generated>"),
            "Declared record table"
        );
        table
    }

    fn api_surface(&self, table: &TableDecl) -> Result<(RestApiDecl, Vec<ComputeUnit>)> {
        let mut api = RestApiDecl::new(&self.config.api.name, &self.config.api.stage);
        let mut units = Vec::with_capacity(self.routes.len() + 2);

        for route in self.routes {
            let path = PathTemplate::parse(route.path)?;
            let mut unit = self.factory.create(BuildTarget::Api, route.name);
            unit.grant(PolicyStatement::table_full_access(&table.logical_id));
            unit.grant(PolicyStatement::storage_and_logs());

            api.bind(route.method, path, &unit.name);
            debug!(unit = route.name, method = %route.method, path = route.path, "Bound endpoint");
            units.push(unit);
        }

        info!(
            api = %api.name,
            stage = %api.stage,
            endpoints = api.bindings.len(),
            "Declared API surface"
        );
        Ok((api, units))
    }

    fn bucket(&self, table: &TableDecl) -> (BucketDecl, ComputeUnit) {
        let mut bucket = BucketDecl::new(&self.config.bucket.name);
        let mut handler = self.factory.create(BuildTarget::S3Event, BUCKET_HANDLER);
        handler.grant(PolicyStatement::bucket_read_write(&bucket.bucket_name));
        handler.grant(PolicyStatement::table_full_access(&table.logical_id));

        bucket.subscribe(BucketEvent::ObjectCreated, &handler.name);
        bucket.subscribe(BucketEvent::ObjectRemoved, &handler.name);

        info!(bucket = %bucket.bucket_name, unit = BUCKET_HANDLER, "Declared bucket notifications");
        (bucket, handler)
    }

    fn schedule(&self, table: &TableDecl) -> (ScheduleDecl, ComputeUnit) {
        let mut handler = self.factory.create(BuildTarget::Schedule, SCHEDULE_HANDLER);
        if self.config.schedule.grant_table_access {
            handler.grant(PolicyStatement::table_full_access(&table.logical_id));
        }

        let schedule = ScheduleDecl::every(SCHEDULE_RATE_MINUTES, &handler.name);
        info!(
            expression = %schedule.expression(),
            unit = SCHEDULE_HANDLER,
            "Declared schedule"
        );
        (schedule, handler)
    }
}

/// Validate the configuration, then compose its topology
pub fn compose(config: &StackConfig) -> Result<Topology> {
    config
        .validate()
        .map_err(|e| TopologyError::InvalidConfig {
            message: format!("{:#}", e),
        })?;
    StackComposer::new(config).compose()
}

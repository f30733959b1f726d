//! `routes` and `describe`: read-only views of the stack

use anyhow::Result;
use clap::Args;
use clean_serverless_config::StackConfig;
use clean_serverless_topology::{compose, Topology, ROUTES};

#[derive(Args)]
pub struct DescribeArgs {
    /// Print the composed topology as JSON
    #[arg(long)]
    pub json: bool,
}

/// Print the static route table
pub fn routes() -> Result<()> {
    for route in &ROUTES {
        println!("{:<7} {:<48} {}", route.method, route.path, route.name);
    }
    Ok(())
}

pub fn describe(args: DescribeArgs, config: &StackConfig) -> Result<()> {
    let topology = compose(config)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&topology)?);
    } else {
        print_summary(&topology);
    }
    Ok(())
}

fn print_summary(topology: &Topology) {
    let table = &topology.table;
    println!("Stack: {}", topology.stack_name);
    if let Some(description) = &topology.description {
        println!("  {}", description);
    }
    println!();
    println!(
        "Table: {} (partition key {}, sort key {}, {})",
        table.table_name.as_deref().unwrap_or("<generated>"),
        table.partition_key.name,
        table.sort_key.name,
        table.billing_mode.as_str()
    );
    println!();
    println!(
        "API: {} (stage {}, {} endpoints)",
        topology.api.name,
        topology.api.stage,
        topology.api.bindings.len()
    );
    for binding in &topology.api.bindings {
        println!("  {:<7} {:<48} -> {}", binding.method, binding.path.to_string(), binding.unit);
    }
    println!();
    println!("Bucket: {}", topology.bucket.bucket_name);
    for subscription in &topology.bucket.subscriptions {
        println!(
            "  {:<22} -> {}",
            subscription.event.s3_event(),
            subscription.unit
        );
    }
    println!();
    println!(
        "Schedule: {} -> {}",
        topology.schedule.expression(),
        topology.schedule.target
    );
    println!();
    println!(
        "Compute units: {} ({} behind the API, {} image builds)",
        topology.units.len(),
        topology.api_units().count(),
        topology.images().len()
    );
    for unit in &topology.units {
        println!(
            "  {:<20} {:<9} {}",
            unit.name, unit.image.target, unit.function_name
        );
    }
}

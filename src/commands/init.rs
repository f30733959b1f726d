//! `init`: starter stack configuration wizard

use anyhow::{anyhow, Context, Result};
use clap::Args;
use clean_serverless_config::{validate_bucket_name, StackConfig};
use dialoguer::{Confirm, Input};
use std::fs;
use std::path::PathBuf;

use super::names;

const TEMPLATE: &str = include_str!("../../templates/stack.toml");

#[derive(Args)]
pub struct InitArgs {
    /// Stack name
    #[arg(long)]
    pub stack_name: Option<String>,

    /// Bucket receiving object notifications
    #[arg(long)]
    pub bucket: Option<String>,

    /// Record table name
    #[arg(long)]
    pub table_name: Option<String>,

    /// File to write
    #[arg(short, long, value_name = "FILE", default_value = "stack.toml")]
    pub output: PathBuf,

    /// Overwrite existing file without asking
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    println!();
    println!("clean-serverless init - stack configuration");
    println!();

    let stack_name = match args.stack_name {
        Some(name) => {
            validate_stack_name(&name).map_err(|e| anyhow!("Invalid stack name: {}", e))?;
            name
        }
        None => Input::new()
            .with_prompt("Stack name")
            .default(names::generate())
            .validate_with(|input: &String| validate_stack_name(input))
            .interact_text()?,
    };

    let bucket_name = match args.bucket {
        Some(bucket) => {
            validate_bucket_name(&bucket).map_err(|e| anyhow!("Invalid bucket name: {}", e))?;
            bucket
        }
        None => Input::new()
            .with_prompt("Bucket name for uploads")
            .default(format!("{}-uploads", stack_name.to_ascii_lowercase()))
            .validate_with(|input: &String| validate_bucket_name(input))
            .interact_text()?,
    };

    let table_name = match args.table_name {
        Some(table) => {
            validate_table_name(&table).map_err(|e| anyhow!("Invalid table name: {}", e))?;
            table
        }
        None => Input::new()
            .with_prompt("Record table name")
            .default(format!("{}-records", stack_name))
            .validate_with(|input: &String| validate_table_name(input))
            .interact_text()?,
    };

    let output_path = args.output;
    if output_path.exists() && !args.force {
        let overwrite = Confirm::new()
            .with_prompt(format!(
                "{} already exists. Overwrite?",
                output_path.display()
            ))
            .default(false)
            .interact()?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    let content = render(&stack_name, &bucket_name, &table_name);
    fs::write(&output_path, &content)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    println!();
    println!("Created {}", output_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Review the table key names and compute settings.");
    println!("  2. Synthesize:");
    println!(
        "     clean-serverless --config {} synth",
        output_path.display()
    );
    println!();

    Ok(())
}

fn render(stack_name: &str, bucket_name: &str, table_name: &str) -> String {
    TEMPLATE
        .replace("{{STACK_NAME}}", stack_name)
        .replace("{{BUCKET_NAME}}", bucket_name)
        .replace("{{TABLE_NAME}}", table_name)
}

fn validate_stack_name(input: &str) -> Result<(), String> {
    let mut config = StackConfig::default();
    config.stack.name = input.to_string();
    config.table.missing_values = clean_serverless_config::MissingValuePolicy::Empty;
    config.validate().map_err(|e| e.to_string())
}

fn validate_table_name(input: &str) -> Result<(), String> {
    if input.len() < 3 || input.len() > 255 {
        return Err("Table name must be 3-255 characters".to_string());
    }
    if !input
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(
            "Table name may only contain letters, numbers, underscores, hyphens, and dots"
                .to_string(),
        );
    }
    Ok(())
}

//! `synth`: write the CloudFormation template and image manifest

use anyhow::{Context, Result};
use clap::Args;
use clean_serverless_config::StackConfig;
use clean_serverless_topology::synth::ASSETS_FILE_NAME;
use clean_serverless_topology::{compose, synthesize, Synthesized};
use dialoguer::Confirm;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args)]
pub struct SynthArgs {
    /// Directory receiving the template and asset manifest
    #[arg(short, long, value_name = "DIR", default_value = "stack.out")]
    pub out: PathBuf,

    /// Overwrite existing files without asking
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: SynthArgs, config: &StackConfig) -> Result<()> {
    let topology = compose(config)?;
    let synthesized = synthesize(&topology)?;

    let template_path = args
        .out
        .join(Synthesized::template_file_name(&topology.stack_name));
    let assets_path = args.out.join(ASSETS_FILE_NAME);

    if !args.force && !confirm_overwrite(&[&template_path, &assets_path])? {
        println!("Aborted.");
        return Ok(());
    }

    fs::create_dir_all(&args.out)
        .with_context(|| format!("Failed to create output directory {}", args.out.display()))?;
    write_json(&template_path, &synthesized.template.to_json()?)?;
    write_json(&assets_path, &synthesized.assets.to_json()?)?;

    info!(
        template = %template_path.display(),
        assets = %assets_path.display(),
        "Wrote synthesized stack"
    );
    print_next_steps(&topology.stack_name, &template_path, &synthesized);
    Ok(())
}

fn confirm_overwrite(paths: &[&Path]) -> Result<bool> {
    let existing: Vec<String> = paths
        .iter()
        .filter(|p| p.exists())
        .map(|p| p.display().to_string())
        .collect();
    if existing.is_empty() {
        return Ok(true);
    }

    let overwrite = Confirm::new()
        .with_prompt(format!("{} already exists. Overwrite?", existing.join(" and ")))
        .default(false)
        .interact()?;
    Ok(overwrite)
}

fn write_json(path: &Path, content: &str) -> Result<()> {
    fs::write(path, format!("{}\n", content))
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn print_next_steps(stack_name: &str, template_path: &Path, synthesized: &Synthesized) {
    println!();
    println!(
        "Created {} ({} resources)",
        template_path.display(),
        synthesized.template.resources.len()
    );
    println!();
    println!("Next steps:");
    println!("  1. Build each image and push it to the stack's account and region:");
    for asset in synthesized.assets.docker_images.values() {
        println!("     {}", asset.build_command());
    }
    println!("     Tag each image as <account>.dkr.ecr.<region>.amazonaws.com/<repository>:<tag>");
    println!("     and push it before deploying.");
    println!();
    println!("  2. Deploy:");
    println!("     aws cloudformation deploy \\");
    println!("       --template-file {} \\", template_path.display());
    println!("       --stack-name {} \\", stack_name);
    println!("       --capabilities CAPABILITY_IAM");
    println!();
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use clean_serverless::commands::{self, init::InitArgs, inspect::DescribeArgs, synth::SynthArgs};
use clean_serverless::EnvFile;
use clean_serverless_config::LoggingConfig;
use std::path::PathBuf;
use tracing::debug;

/// Synthesize the clean-serverless sample stack
#[derive(Parser)]
#[command(name = "clean-serverless")]
#[command(version)]
#[command(about = "Synthesize the clean-serverless sample stack into a CloudFormation template", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Environment file to load before reading configuration (default: ./.env if present)
    #[arg(long, value_name = "FILE", global = true)]
    env_file: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the CloudFormation template and image manifest
    Synth(SynthArgs),
    /// Print the route table
    Routes,
    /// Print the composed topology
    Describe(DescribeArgs),
    /// Create a starter stack configuration
    Init(InitArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Step 1: Environment file, before any variable is read
    let env_file = clean_serverless::load_env_file(cli.env_file.as_deref())?;

    match cli.command {
        Commands::Routes => {
            init_default_tracing(cli.log_level);
            commands::inspect::routes()
        }
        Commands::Init(args) => {
            init_default_tracing(cli.log_level);
            commands::init::run(args)
        }
        Commands::Synth(args) => {
            let config = load(cli.config, cli.log_level, &env_file)?;
            commands::synth::run(args, &config)
        }
        Commands::Describe(args) => {
            let config = load(cli.config, cli.log_level, &env_file)?;
            commands::inspect::describe(args, &config)
        }
    }
}

fn init_default_tracing(log_level: Option<String>) {
    let mut logging = LoggingConfig::default();
    if let Some(level) = log_level {
        logging.level = level;
    }
    clean_serverless::init_tracing(&logging);
}

fn load(
    config_path: Option<PathBuf>,
    log_level: Option<String>,
    env_file: &EnvFile,
) -> Result<clean_serverless_config::StackConfig> {
    // Step 2: Configuration file and environment overrides, validated
    let mut config = commands::load_config(config_path.as_deref())?;

    // Step 3: CLI overrides (highest priority)
    if let Some(level) = log_level {
        config.logging.level = level;
    }

    // Step 4: Tracing; composition re-validates so warnings are logged
    clean_serverless::init_tracing(&config.logging);
    match env_file {
        EnvFile::Loaded(path) => debug!(path = %path.display(), "Loaded environment file"),
        EnvFile::NotFound => debug!("No .env file found"),
    }

    Ok(config)
}

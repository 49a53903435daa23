//! journeykit CLI - Main Entry Point
//!
//! Polls test environments the same way suites do and inspects the
//! environment data they run against.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{env, wait};
use journeykit_e2e::{EnvironmentData, FrameworkConfig, World};

/// journeykit CLI - end-to-end test support
#[derive(Parser)]
#[command(name = "journeykit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Framework configuration file
    #[arg(long, default_value = "journeykit.toml", global = true)]
    config: PathBuf,

    /// Environment data file, overriding the configured one
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Target environment, overriding config and JOURNEYKIT_TARGET
    #[arg(long, global = true)]
    target: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll an endpoint until a record matches
    Wait(wait::WaitArgs),

    /// Inspect environment data
    #[command(subcommand)]
    Env(env::EnvCommands),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let mut config = FrameworkConfig::load_with_env(&cli.config)?;
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    if let Some(target) = cli.target {
        config.target = target;
    }
    config.validate()?;

    match cli.command {
        Commands::Wait(args) => {
            let mut world = World::load(config)?;
            if !wait::execute(args, &mut world, cli.format).await? {
                std::process::exit(1);
            }
        }
        Commands::Env(cmd) => {
            let data = EnvironmentData::from_file(&config.data_path)?;
            env::execute(cmd, &data, cli.format).await?;
        }
        Commands::Version => {
            println!("journeykit CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Target: {}", config.target);
            println!("Environment data: {}", config.data_path.display());
        }
    }

    Ok(())
}

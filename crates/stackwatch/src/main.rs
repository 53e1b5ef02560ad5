mod commands;
mod render;
mod utils;

use clap::{Parser, Subcommand};
use stackwatch_aws::{AwsCli, CloudFormationCli};
use stackwatch_config::WatchSettings;
use std::path::PathBuf;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stackwatch")]
#[command(about = "Deploy CloudFormation stacks and watch them settle", long_about = None)]
struct Cli {
    /// AWS region (overrides STACKWATCH_REGION and the settings file)
    #[arg(long, global = true)]
    region: Option<String>,

    /// AWS CLI profile (overrides STACKWATCH_PROFILE and the settings file)
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update a stack from a template and watch it
    Up {
        /// Stack name
        #[arg(short, long)]
        stack: String,
        /// Template file
        #[arg(short, long)]
        template: PathBuf,
        /// JSON file of stack tags
        #[arg(long, default_value = "tags.json")]
        tags: PathBuf,
        /// JSON file of template parameters
        #[arg(long, default_value = "parameters.json")]
        parameters: PathBuf,
        /// Execute the change set without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete a stack and watch its resources go away
    Down {
        /// Stack name
        #[arg(short, long)]
        stack: String,
    },
    /// Watch a stack that is already changing
    Watch {
        /// Stack name
        #[arg(short, long)]
        stack: String,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    if matches!(cli.command, Commands::Version) {
        println!("stackwatch {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut settings = WatchSettings::load()?;
    if cli.region.is_some() {
        settings.region = cli.region;
    }
    if cli.profile.is_some() {
        settings.profile = cli.profile;
    }
    tracing::debug!("Settings: {:?}", settings);

    let mut aws = AwsCli::new();
    if let Some(region) = &settings.region {
        aws = aws.with_region(region);
    }
    if let Some(profile) = &settings.profile {
        aws = aws.with_profile(profile);
    }
    let api = CloudFormationCli::new(aws);
    let config = settings.watch_config();

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("Ctrl-C received");
            let _ = cancel_tx.send(true);
        }
    });

    match cli.command {
        Commands::Up {
            stack,
            template,
            tags,
            parameters,
            yes,
        } => {
            let args = commands::up::UpArgs {
                stack,
                template,
                tags,
                parameters,
                yes,
            };
            commands::up::handle(&api, config, cancel_rx, args).await?;
        }
        Commands::Down { stack } => {
            commands::down::handle(&api, config, cancel_rx, &stack).await?;
        }
        Commands::Watch { stack } => {
            commands::watch::handle(&api, config, cancel_rx, &stack).await?;
        }
        Commands::Version => {}
    }

    Ok(())
}

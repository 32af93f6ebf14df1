mod cmd;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "carrier",
    about = "Batch-load SPARQL update files into a triplestore, resumably",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a directory of update files to the endpoint, skipping
    /// everything already recorded in the applied-set store
    Load {
        /// Path to the load configuration YAML
        #[arg(long, short = 'c', env = "CARRIER_CONFIG", default_value = "carrier.yaml")]
        config: PathBuf,

        /// Suppress the progress bar
        #[arg(long)]
        quiet: bool,

        /// Print the run report as JSON
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// Create (and optionally publish) an archival deposit on an
    /// InvenioRDM repository
    Deposit {
        /// Path to the deposit configuration YAML
        config: PathBuf,

        /// Publish after uploading instead of leaving a draft for review
        #[arg(long)]
        publish: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Load {
            config,
            quiet,
            json,
        } => cmd::load::run(&config, quiet, json),
        Commands::Deposit { config, publish } => cmd::deposit::run(&config, publish),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

//! procmon CLI - project broker topics into a SQLite snapshot

use anyhow::Result;
use clap::{Parser, Subcommand};
use procmon::{StartPosition, Topic};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "procmon")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the SQLite state database
    #[arg(long = "db", global = true, env = "PROCMON_DB")]
    db_path: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project topic files into the state database until interrupted
    Run(RunArgs),

    /// Show row counts of the state database
    Status,

    /// Decode an NDJSON file of records and print each envelope and payload
    Decode {
        /// NDJSON file, one record per line
        file: PathBuf,
    },
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Directory holding one `<prefix><topic>.ndjson` file per topic
    #[arg(short, long)]
    input_dir: PathBuf,

    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where each topic starts reading: earliest or latest
    #[arg(long = "from")]
    start_position: Option<StartPosition>,

    /// Prefix of every topic file name
    #[arg(long)]
    topic_prefix: Option<String>,

    /// Topics to project, comma separated (default: all)
    #[arg(long, value_delimiter = ',')]
    topics: Vec<Topic>,

    /// Poll interval at end of file (milliseconds)
    #[arg(long)]
    poll_interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    // Execute command
    match cli.command {
        Commands::Run(args) => {
            commands::run::execute(cli.db_path, args).await?;
        }
        Commands::Status => {
            commands::status::execute(cli.db_path)?;
        }
        Commands::Decode { file } => {
            commands::decode::execute(file)?;
        }
    }

    Ok(())
}

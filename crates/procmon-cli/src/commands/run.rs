//! Run command implementation

use crate::RunArgs;
use anyhow::{Context, Result};
use procmon::prelude::*;
use std::path::PathBuf;

/// Merge the optional config file with command-line overrides.
fn build_config(db_path: Option<PathBuf>, args: &RunArgs) -> Result<ProcmonConfig> {
    let mut config = match &args.config {
        Some(path) => ProcmonConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ProcmonConfig::default(),
    };

    if let Some(db_path) = db_path {
        config.store.path = db_path;
    }
    if let Some(position) = args.start_position {
        config.router.start_position = position;
    }
    if let Some(prefix) = &args.topic_prefix {
        config.router.topic_prefix = prefix.clone();
    }
    if !args.topics.is_empty() {
        config.router.topics = args.topics.clone();
    }
    if let Some(ms) = args.poll_interval_ms {
        config.router.poll_interval_ms = ms;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

pub async fn execute(db_path: Option<PathBuf>, args: RunArgs) -> Result<()> {
    let config = build_config(db_path, &args)?;

    tracing::info!(
        db = %config.store.path.display(),
        input_dir = %args.input_dir.display(),
        "Starting procmon"
    );

    let procmon = Procmon::open(config).context("Failed to open state store")?;
    let source = Arc::new(FileSource::new(&args.input_dir));
    let router = procmon
        .start(source)
        .await
        .context("Failed to start topic router")?;

    println!("Projecting topics from {} (Press Ctrl+C to stop)", args.input_dir.display());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    tracing::info!("Shutdown requested");
    let stats = router
        .shutdown_and_join()
        .await
        .context("Topic router failed")?;

    println!("\nRecords per topic");
    println!("{}", "=".repeat(60));
    for topic in Topic::ALL {
        if let Some(s) = stats.topics.get(&topic) {
            println!(
                "{:<18} received {:>8}  applied {:>8}  decode failures {:>6}  dispatch failures {:>6}",
                topic.name(),
                s.received,
                s.applied,
                s.decode_failures,
                s.dispatch_failures
            );
        }
    }

    Ok(())
}

//! Status command implementation

use anyhow::{bail, Context, Result};
use procmon::prelude::*;
use std::path::PathBuf;

pub fn execute(db_path: Option<PathBuf>) -> Result<()> {
    let path = db_path.unwrap_or_else(|| StoreConfig::default().path);
    tracing::info!("Checking database status: {}", path.display());

    if !path.exists() {
        bail!("No state database at {}", path.display());
    }

    let store =
        SqliteStateStore::open(StoreConfig::new(&path)).context("Failed to open state database")?;

    println!("\nState Database");
    println!("{}", "=".repeat(60));
    println!("Path: {}", path.display());

    let schema_version = store
        .schema_version()
        .context("Failed to get schema version")?;
    println!("Schema Version: {}", schema_version);

    let counts = store.counts().context("Failed to count rows")?;
    println!("\nProcesses:  {}", counts.processes);
    println!(
        "Instances:  {} ({} active)",
        counts.instances, counts.active_instances
    );
    println!("Variables:  {}", counts.variables);
    println!(
        "Incidents:  {} ({} open)",
        counts.incidents, counts.open_incidents
    );
    println!("Jobs:       {}", counts.jobs);
    println!("Audit log:  {}", counts.audit_log);

    Ok(())
}

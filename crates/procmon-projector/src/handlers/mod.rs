//! Built-in handlers, one per projected topic.

mod deployment;
mod incident;
mod job;
mod process;
mod process_instance;
mod variable;

pub use deployment::DeploymentHandler;
pub use incident::IncidentHandler;
pub use job::JobHandler;
pub use process::ProcessHandler;
pub use process_instance::ProcessInstanceHandler;
pub use variable::VariableHandler;

use procmon_core::{Record, Result};

/// Log an intent the handler has no projection for.
fn unhandled_intent(topic: &str, record: &Record) -> Result<()> {
    tracing::warn!(
        topic,
        intent = %record.intent,
        key = record.key,
        position = record.position,
        "Unhandled intent, skipping record"
    );
    Ok(())
}

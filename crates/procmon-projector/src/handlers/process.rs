use super::unhandled_intent;
use crate::TopicHandler;
use procmon_core::intent::process;
use procmon_core::record::ProcessValue;
use procmon_core::{Record, Result, Topic};

/// Process definitions are persisted from deployments; process records are
/// only logged.
pub struct ProcessHandler;

impl ProcessHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProcessHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicHandler for ProcessHandler {
    fn topic(&self) -> &str {
        Topic::Process.name()
    }

    fn handle(&self, record: &Record) -> Result<()> {
        match record.intent.as_str() {
            process::CREATED => {
                let process = record.cast::<ProcessValue>()?;
                tracing::info!(
                    bpmn_process_id = %process.value.bpmn_process_id,
                    version = process.value.version,
                    definition_key = process.value.process_definition_key,
                    "Process created"
                );
                Ok(())
            }
            _ => unhandled_intent(self.topic(), record),
        }
    }
}

use super::unhandled_intent;
use crate::TopicHandler;
use procmon_core::intent::{element_type, process_instance};
use procmon_core::record::ProcessInstanceValue;
use procmon_core::{AuditLogEntry, Record, Result, StateStore, Topic};
use std::sync::Arc;

/// Records every element transition in the audit log, and tracks the
/// lifecycle of the instance itself from its `PROCESS` element.
pub struct ProcessInstanceHandler {
    store: Arc<dyn StateStore>,
}

impl ProcessInstanceHandler {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }
}

impl TopicHandler for ProcessInstanceHandler {
    fn topic(&self) -> &str {
        Topic::ProcessInstance.name()
    }

    fn handle(&self, record: &Record) -> Result<()> {
        let typed = record.cast::<ProcessInstanceValue>()?;
        let v = &typed.value;

        // Audit failures are logged only; the lifecycle update still runs.
        if let Err(e) = self.store.audit_log_event_occurred(&AuditLogEntry {
            partition_id: record.partition_id,
            position: record.position,
            instance_key: v.process_instance_key,
            element_id: v.element_id.clone(),
            element_type: v.bpmn_element_type.clone(),
            intent: record.intent.clone(),
            timestamp: record.timestamp,
        }) {
            tracing::error!(
                partition_id = record.partition_id,
                position = record.position,
                instance_key = v.process_instance_key,
                error = %e,
                "Failed to append audit log entry"
            );
        }

        if v.bpmn_element_type != element_type::PROCESS {
            return Ok(());
        }

        let time = record.time()?;
        match record.intent.as_str() {
            process_instance::ELEMENT_ACTIVATED => {
                self.store.process_instance_activated(
                    v.process_instance_key,
                    v.process_definition_key,
                    v.version,
                    time,
                )?;
                tracing::info!(
                    instance_key = v.process_instance_key,
                    bpmn_process_id = %v.bpmn_process_id,
                    "Process instance activated"
                );
            }
            process_instance::ELEMENT_COMPLETED => {
                self.store.process_instance_completed(v.process_instance_key, time)?;
                tracing::info!(
                    instance_key = v.process_instance_key,
                    "Process instance completed"
                );
            }
            process_instance::ELEMENT_TERMINATED => {
                self.store.process_instance_terminated(v.process_instance_key, time)?;
                tracing::info!(
                    instance_key = v.process_instance_key,
                    "Process instance terminated"
                );
            }
            process_instance::ELEMENT_ACTIVATING
            | process_instance::ELEMENT_COMPLETING
            | process_instance::ELEMENT_TERMINATING => {
                tracing::debug!(
                    instance_key = v.process_instance_key,
                    intent = %record.intent,
                    "Process instance transition"
                );
            }
            _ => return unhandled_intent(self.topic(), record),
        }

        Ok(())
    }
}

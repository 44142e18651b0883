use super::unhandled_intent;
use crate::TopicHandler;
use procmon_core::intent::incident;
use procmon_core::record::IncidentValue;
use procmon_core::{NewIncident, Record, Result, StateStore, Topic};
use std::sync::Arc;

pub struct IncidentHandler {
    store: Arc<dyn StateStore>,
}

impl IncidentHandler {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }
}

impl TopicHandler for IncidentHandler {
    fn topic(&self) -> &str {
        Topic::Incident.name()
    }

    fn handle(&self, record: &Record) -> Result<()> {
        match record.intent.as_str() {
            incident::CREATED => {
                let typed = record.cast::<IncidentValue>()?;
                let v = typed.value;
                self.store.incident_created(&NewIncident {
                    key: record.key,
                    instance_key: v.process_instance_key,
                    element_id: v.element_id,
                    error_type: v.error_type,
                    error_message: v.error_message,
                    time: record.time()?,
                })?;
                tracing::info!(key = record.key, "Incident created");
                Ok(())
            }
            incident::RESOLVED => {
                self.store.incident_resolved(record.key, record.time()?)?;
                tracing::info!(key = record.key, "Incident resolved");
                Ok(())
            }
            _ => unhandled_intent(self.topic(), record),
        }
    }
}

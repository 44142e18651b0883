use super::unhandled_intent;
use crate::TopicHandler;
use procmon_core::intent::variable;
use procmon_core::record::VariableValue;
use procmon_core::{Record, Result, StateStore, Topic};
use std::sync::Arc;

pub struct VariableHandler {
    store: Arc<dyn StateStore>,
}

impl VariableHandler {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }
}

impl TopicHandler for VariableHandler {
    fn topic(&self) -> &str {
        Topic::Variable.name()
    }

    fn handle(&self, record: &Record) -> Result<()> {
        let intent = record.intent.as_str();
        if intent != variable::CREATED && intent != variable::UPDATED {
            return unhandled_intent(self.topic(), record);
        }

        let var = record.cast::<VariableValue>()?;
        let time = record.time()?;
        let v = &var.value;

        if intent == variable::CREATED {
            self.store
                .variable_created(v.process_instance_key, &v.name, &v.value, time)?;
        } else {
            self.store
                .variable_updated(v.process_instance_key, &v.name, &v.value, time)?;
        }

        tracing::debug!(
            instance_key = v.process_instance_key,
            name = %v.name,
            intent,
            "Variable projected"
        );
        Ok(())
    }
}

use crate::TopicHandler;
use procmon_core::intent::job;
use procmon_core::record::JobValue;
use procmon_core::{NewJob, Record, Result, StateStore, Topic};
use std::sync::Arc;

/// Creates a job row on `CREATED`; every other intent becomes the job's
/// state.
pub struct JobHandler {
    store: Arc<dyn StateStore>,
}

impl JobHandler {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }
}

impl TopicHandler for JobHandler {
    fn topic(&self) -> &str {
        Topic::Job.name()
    }

    fn handle(&self, record: &Record) -> Result<()> {
        let typed = record.cast::<JobValue>()?;
        let time = record.time()?;
        let v = typed.value;

        if record.intent == job::CREATED {
            self.store.job_created(&NewJob {
                key: record.key,
                instance_key: v.process_instance_key,
                element_id: v.element_id,
                job_type: v.job_type,
                worker: v.worker,
                retries: v.retries,
                time,
            })?;
        } else {
            self.store
                .job_updated(record.key, v.retries, &v.worker, &record.intent, time)?;
        }

        tracing::debug!(key = record.key, intent = %record.intent, "Job projected");
        Ok(())
    }
}

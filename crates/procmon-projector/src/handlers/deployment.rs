use super::unhandled_intent;
use crate::TopicHandler;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use procmon_core::intent::deployment;
use procmon_core::record::{DeploymentValue, ProcessMetadata};
use procmon_core::{DeployedProcess, ProcmonError, Record, Result, StateStore, Topic};
use std::sync::Arc;

/// Persists every process definition announced by a `CREATED` deployment.
///
/// Each process-metadata entry is resolved against the deployment's resource
/// list by resource name. A failing entry does not stop the others; all
/// failures are reported together once every entry was attempted.
pub struct DeploymentHandler {
    store: Arc<dyn StateStore>,
}

impl DeploymentHandler {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    fn deploy_process(
        &self,
        record: &Record,
        deployment: &DeploymentValue,
        metadata: &ProcessMetadata,
    ) -> Result<()> {
        let resource = deployment
            .resource(&metadata.resource_name)
            .ok_or_else(|| {
                ProcmonError::InvalidState(format!(
                    "resource '{}' of process {} not found in deployment",
                    metadata.resource_name, metadata.process_definition_key
                ))
            })?;

        let bytes = BASE64.decode(&resource.resource).map_err(|e| {
            ProcmonError::InvalidState(format!(
                "resource '{}' is not valid base64: {}",
                metadata.resource_name, e
            ))
        })?;

        self.store.process_deployed(&DeployedProcess {
            definition_key: metadata.process_definition_key,
            bpmn_process_id: metadata.bpmn_process_id.clone(),
            version: metadata.version,
            deployment_time: record.time()?,
            resource: bytes,
        })?;

        tracing::info!(
            bpmn_process_id = %metadata.bpmn_process_id,
            version = metadata.version,
            definition_key = metadata.process_definition_key,
            "Process deployed"
        );
        Ok(())
    }
}

impl TopicHandler for DeploymentHandler {
    fn topic(&self) -> &str {
        Topic::Deployment.name()
    }

    fn handle(&self, record: &Record) -> Result<()> {
        if record.intent != deployment::CREATED {
            return unhandled_intent(self.topic(), record);
        }

        let typed = record.cast::<DeploymentValue>()?;
        let mut errors = Vec::new();

        for metadata in &typed.value.processes_metadata {
            if let Err(e) = self.deploy_process(record, &typed.value, metadata) {
                tracing::error!(
                    definition_key = metadata.process_definition_key,
                    resource_name = %metadata.resource_name,
                    error = %e,
                    "Failed to deploy process"
                );
                errors.push(e);
            }
        }

        ProcmonError::aggregate(errors)
    }
}

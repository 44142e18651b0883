use crate::error::StoreResult;
use chrono::{DateTime, Utc};

/// A process definition announced by a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedProcess {
    pub definition_key: i64,
    pub bpmn_process_id: String,
    pub version: i64,
    pub deployment_time: DateTime<Utc>,
    /// Raw BPMN XML bytes
    pub resource: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIncident {
    pub key: i64,
    pub instance_key: i64,
    pub element_id: String,
    pub error_type: String,
    pub error_message: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub key: i64,
    pub instance_key: i64,
    pub element_id: String,
    pub job_type: String,
    pub worker: String,
    pub retries: i64,
    pub time: DateTime<Utc>,
}

/// One process-instance transition, keyed by `(partition_id, position)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogEntry {
    pub partition_id: i64,
    pub position: i64,
    pub instance_key: i64,
    pub element_id: String,
    pub element_type: String,
    pub intent: String,
    /// Epoch milliseconds, as carried by the record
    pub timestamp: i64,
}

/// Mutation contract of the persisted workflow snapshot.
///
/// Every call is its own unit of work. Creations fail with
/// [`StoreError::AlreadyExists`](crate::StoreError::AlreadyExists) on a
/// duplicate key (no upsert); updates fail with
/// [`StoreError::NotFound`](crate::StoreError::NotFound) when the row they
/// update does not exist. Implementations must tolerate concurrent calls from
/// different topic workers.
pub trait StateStore: Send + Sync {
    fn process_deployed(&self, process: &DeployedProcess) -> StoreResult<()>;

    fn process_instance_activated(
        &self,
        instance_key: i64,
        definition_key: i64,
        version: i64,
        start_time: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Fails unless an ACTIVE instance with this key exists.
    fn process_instance_completed(&self, instance_key: i64, end_time: DateTime<Utc>)
        -> StoreResult<()>;

    /// Fails unless an ACTIVE instance with this key exists.
    fn process_instance_terminated(
        &self,
        instance_key: i64,
        end_time: DateTime<Utc>,
    ) -> StoreResult<()>;

    fn variable_created(
        &self,
        instance_key: i64,
        name: &str,
        value: &str,
        time: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Overwrites value and time of an existing `(instance_key, name)` row.
    fn variable_updated(
        &self,
        instance_key: i64,
        name: &str,
        value: &str,
        time: DateTime<Utc>,
    ) -> StoreResult<()>;

    fn incident_created(&self, incident: &NewIncident) -> StoreResult<()>;

    fn incident_resolved(&self, key: i64, time: DateTime<Utc>) -> StoreResult<()>;

    fn job_created(&self, job: &NewJob) -> StoreResult<()>;

    /// Overwrites retries, worker, state and time. Element id, instance key
    /// and job type are left as created.
    fn job_updated(
        &self,
        key: i64,
        retries: i64,
        worker: &str,
        state: &str,
        time: DateTime<Utc>,
    ) -> StoreResult<()>;

    fn audit_log_event_occurred(&self, entry: &AuditLogEntry) -> StoreResult<()>;
}

//! Tests for record projection through the default handlers

use chrono::{DateTime, Utc};
use procmon_core::{
    AuditLogEntry, DeployedProcess, NewIncident, NewJob, ProcmonError, Record, StateStore,
    StoreError, StoreResult,
};
use procmon_projector::Dispatcher;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    ProcessDeployed(DeployedProcess),
    InstanceActivated {
        instance_key: i64,
        definition_key: i64,
        version: i64,
        start_time: DateTime<Utc>,
    },
    InstanceCompleted(i64, DateTime<Utc>),
    InstanceTerminated(i64, DateTime<Utc>),
    VariableCreated(i64, String, String, DateTime<Utc>),
    VariableUpdated(i64, String, String, DateTime<Utc>),
    IncidentCreated(NewIncident),
    IncidentResolved(i64, DateTime<Utc>),
    JobCreated(NewJob),
    JobUpdated {
        key: i64,
        retries: i64,
        worker: String,
        state: String,
        time: DateTime<Utc>,
    },
    AuditLog(AuditLogEntry),
}

/// Records every call; optionally fails a chosen kind of call.
#[derive(Default)]
struct RecordingStore {
    calls: Mutex<Vec<Call>>,
    fail_audit: bool,
    fail_mutations: bool,
}

impl RecordingStore {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, call: Call) -> StoreResult<()> {
        let is_audit = matches!(call, Call::AuditLog(_));
        self.calls.lock().unwrap().push(call);
        if (is_audit && self.fail_audit) || (!is_audit && self.fail_mutations) {
            return Err(StoreError::Database("disk full".into()));
        }
        Ok(())
    }
}

impl StateStore for RecordingStore {
    fn process_deployed(&self, process: &DeployedProcess) -> StoreResult<()> {
        self.push(Call::ProcessDeployed(process.clone()))
    }

    fn process_instance_activated(
        &self,
        instance_key: i64,
        definition_key: i64,
        version: i64,
        start_time: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.push(Call::InstanceActivated {
            instance_key,
            definition_key,
            version,
            start_time,
        })
    }

    fn process_instance_completed(
        &self,
        instance_key: i64,
        end_time: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.push(Call::InstanceCompleted(instance_key, end_time))
    }

    fn process_instance_terminated(
        &self,
        instance_key: i64,
        end_time: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.push(Call::InstanceTerminated(instance_key, end_time))
    }

    fn variable_created(
        &self,
        instance_key: i64,
        name: &str,
        value: &str,
        time: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.push(Call::VariableCreated(
            instance_key,
            name.into(),
            value.into(),
            time,
        ))
    }

    fn variable_updated(
        &self,
        instance_key: i64,
        name: &str,
        value: &str,
        time: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.push(Call::VariableUpdated(
            instance_key,
            name.into(),
            value.into(),
            time,
        ))
    }

    fn incident_created(&self, incident: &NewIncident) -> StoreResult<()> {
        self.push(Call::IncidentCreated(incident.clone()))
    }

    fn incident_resolved(&self, key: i64, time: DateTime<Utc>) -> StoreResult<()> {
        self.push(Call::IncidentResolved(key, time))
    }

    fn job_created(&self, job: &NewJob) -> StoreResult<()> {
        self.push(Call::JobCreated(job.clone()))
    }

    fn job_updated(
        &self,
        key: i64,
        retries: i64,
        worker: &str,
        state: &str,
        time: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.push(Call::JobUpdated {
            key,
            retries,
            worker: worker.into(),
            state: state.into(),
            time,
        })
    }

    fn audit_log_event_occurred(&self, entry: &AuditLogEntry) -> StoreResult<()> {
        self.push(Call::AuditLog(entry.clone()))
    }
}

const TIMESTAMP: i64 = 1_700_000_000_123;

fn at(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap()
}

fn setup(store: RecordingStore) -> (Dispatcher, Arc<RecordingStore>) {
    let store = Arc::new(store);
    let dispatcher = Dispatcher::with_default_handlers(store.clone());
    (dispatcher, store)
}

fn event(value_type: &str, intent: &str, key: i64, position: i64, value: &str) -> Record {
    Record::decode(
        format!(
            r#"{{"valueType":"{value_type}","intent":"{intent}","recordType":"EVENT",
                "partitionId":1,"key":{key},"position":{position},"timestamp":{TIMESTAMP},
                "value":{value}}}"#
        )
        .as_bytes(),
    )
    .unwrap()
}

fn process_instance(intent: &str, element_type: &str, position: i64) -> Record {
    event(
        "PROCESS_INSTANCE",
        intent,
        100,
        position,
        &format!(
            r#"{{"bpmnProcessId":"order","version":3,"processDefinitionKey":7,
                "processInstanceKey":100,"elementId":"order-flow",
                "bpmnElementType":"{element_type}"}}"#
        ),
    )
}

fn audit(intent: &str, element_type: &str, position: i64) -> Call {
    Call::AuditLog(AuditLogEntry {
        partition_id: 1,
        position,
        instance_key: 100,
        element_id: "order-flow".into(),
        element_type: element_type.into(),
        intent: intent.into(),
        timestamp: TIMESTAMP,
    })
}

fn variable(intent: &str, value: &str, position: i64) -> Record {
    event(
        "VARIABLE",
        intent,
        55,
        position,
        &format!(
            r#"{{"name":"amount","value":"{value}","processInstanceKey":100,"scopeKey":100}}"#
        ),
    )
}

fn job(intent: &str, retries: i64, worker: &str) -> Record {
    event(
        "JOB",
        intent,
        42,
        20,
        &format!(
            r#"{{"type":"payment","elementId":"charge","processInstanceKey":100,
                "retries":{retries},"worker":"{worker}","customHeaders":{{"tier":"gold"}}}}"#
        ),
    )
}

fn deployment(resources: &str, metadata: &str) -> Record {
    event(
        "DEPLOYMENT",
        "CREATED",
        9,
        1,
        &format!(r#"{{"resources":[{resources}],"processesMetadata":[{metadata}]}}"#),
    )
}

fn metadata(definition_key: i64, resource_name: &str) -> String {
    format!(
        r#"{{"bpmnProcessId":"order","version":1,"processDefinitionKey":{definition_key},
            "resourceName":"{resource_name}"}}"#
    )
}

// base64 of "<bpmn/>"
const BPMN_B64: &str = "PGJwbW4vPg==";

#[test]
fn test_default_handlers_cover_all_topics() {
    let (dispatcher, _store) = setup(RecordingStore::default());

    assert_eq!(
        dispatcher.topics(),
        vec!["deployment", "incident", "job", "process", "process-instance", "variable"]
    );
}

#[test]
fn test_process_activated_records_audit_then_activation() {
    let (dispatcher, store) = setup(RecordingStore::default());

    dispatcher
        .dispatch("process-instance", &process_instance("ELEMENT_ACTIVATED", "PROCESS", 11))
        .unwrap();

    assert_eq!(
        store.calls(),
        vec![
            audit("ELEMENT_ACTIVATED", "PROCESS", 11),
            Call::InstanceActivated {
                instance_key: 100,
                definition_key: 7,
                version: 3,
                start_time: at(TIMESTAMP),
            },
        ]
    );
}

#[test]
fn test_process_activating_is_audit_only() {
    let (dispatcher, store) = setup(RecordingStore::default());

    dispatcher
        .dispatch("process-instance", &process_instance("ELEMENT_ACTIVATING", "PROCESS", 10))
        .unwrap();

    assert_eq!(store.calls(), vec![audit("ELEMENT_ACTIVATING", "PROCESS", 10)]);
}

#[test]
fn test_process_completed_and_terminated() {
    let (dispatcher, store) = setup(RecordingStore::default());

    dispatcher
        .dispatch("process-instance", &process_instance("ELEMENT_COMPLETED", "PROCESS", 12))
        .unwrap();
    dispatcher
        .dispatch("process-instance", &process_instance("ELEMENT_TERMINATED", "PROCESS", 13))
        .unwrap();

    assert_eq!(
        store.calls(),
        vec![
            audit("ELEMENT_COMPLETED", "PROCESS", 12),
            Call::InstanceCompleted(100, at(TIMESTAMP)),
            audit("ELEMENT_TERMINATED", "PROCESS", 13),
            Call::InstanceTerminated(100, at(TIMESTAMP)),
        ]
    );
}

#[test]
fn test_non_process_elements_are_audit_only() {
    let (dispatcher, store) = setup(RecordingStore::default());

    dispatcher
        .dispatch("process-instance", &process_instance("ELEMENT_ACTIVATED", "SERVICE_TASK", 14))
        .unwrap();
    dispatcher
        .dispatch("process-instance", &process_instance("ELEMENT_COMPLETED", "END_EVENT", 15))
        .unwrap();

    assert_eq!(
        store.calls(),
        vec![
            audit("ELEMENT_ACTIVATED", "SERVICE_TASK", 14),
            audit("ELEMENT_COMPLETED", "END_EVENT", 15),
        ]
    );
}

#[test]
fn test_audit_failure_does_not_block_activation() {
    let (dispatcher, store) = setup(RecordingStore {
        fail_audit: true,
        ..Default::default()
    });

    dispatcher
        .dispatch("process-instance", &process_instance("ELEMENT_ACTIVATED", "PROCESS", 11))
        .unwrap();

    let calls = store.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[1], Call::InstanceActivated { instance_key: 100, .. }));
}

#[test]
fn test_unknown_process_instance_intent_is_audited_only() {
    let (dispatcher, store) = setup(RecordingStore::default());

    dispatcher
        .dispatch("process-instance", &process_instance("ELEMENT_MIGRATED", "PROCESS", 16))
        .unwrap();

    assert_eq!(store.calls(), vec![audit("ELEMENT_MIGRATED", "PROCESS", 16)]);
}

#[test]
fn test_variable_created_then_updated_in_order() {
    let (dispatcher, store) = setup(RecordingStore::default());

    dispatcher.dispatch("variable", &variable("CREATED", "10", 30)).unwrap();
    dispatcher.dispatch("variable", &variable("UPDATED", "25", 31)).unwrap();

    assert_eq!(
        store.calls(),
        vec![
            Call::VariableCreated(100, "amount".into(), "10".into(), at(TIMESTAMP)),
            Call::VariableUpdated(100, "amount".into(), "25".into(), at(TIMESTAMP)),
        ]
    );
}

#[test]
fn test_variable_unknown_intent_makes_no_calls() {
    let (dispatcher, store) = setup(RecordingStore::default());

    dispatcher.dispatch("variable", &variable("MIGRATED", "10", 30)).unwrap();

    assert!(store.calls().is_empty());
}

#[test]
fn test_unknown_topic_makes_no_calls() {
    let (dispatcher, store) = setup(RecordingStore::default());

    let record = event("TIMER", "CREATED", 1, 1, r#"{"dueDate":5}"#);
    dispatcher.dispatch("timer", &record).unwrap();

    assert!(store.calls().is_empty());
}

fn command(value_type: &str, intent: &str, key: i64, position: i64, value: &str) -> Record {
    Record::decode(
        format!(
            r#"{{"valueType":"{value_type}","intent":"{intent}","recordType":"COMMAND",
                "partitionId":1,"key":{key},"position":{position},"timestamp":{TIMESTAMP},
                "value":{value}}}"#
        )
        .as_bytes(),
    )
    .unwrap()
}

#[test]
fn test_job_command_updates_job_state() {
    let (dispatcher, store) = setup(RecordingStore::default());

    let complete = command(
        "JOB",
        "COMPLETE",
        42,
        9,
        r#"{"type":"payment","elementId":"charge","processInstanceKey":100,
            "retries":3,"worker":"w1"}"#,
    );
    dispatcher.dispatch("job", &complete).unwrap();

    assert_eq!(
        store.calls(),
        vec![Call::JobUpdated {
            key: 42,
            retries: 3,
            worker: "w1".into(),
            state: "COMPLETE".into(),
            time: at(TIMESTAMP),
        }]
    );
}

#[test]
fn test_process_instance_command_is_audited() {
    let (dispatcher, store) = setup(RecordingStore::default());

    let activate = command(
        "PROCESS_INSTANCE",
        "ACTIVATE_ELEMENT",
        100,
        4,
        r#"{"bpmnProcessId":"order","version":3,"processDefinitionKey":7,
            "processInstanceKey":100,"elementId":"order-flow","bpmnElementType":"PROCESS"}"#,
    );
    dispatcher.dispatch("process-instance", &activate).unwrap();

    // Unknown intent for the instance itself: audit entry only
    assert_eq!(store.calls(), vec![audit("ACTIVATE_ELEMENT", "PROCESS", 4)]);
}

#[test]
fn test_unrepresentable_timestamp_still_audited() {
    let (dispatcher, store) = setup(RecordingStore::default());

    let record = Record::decode(
        format!(
            r#"{{"valueType":"PROCESS_INSTANCE","intent":"ELEMENT_ACTIVATED","recordType":"EVENT",
                "partitionId":1,"key":100,"position":6,"timestamp":{},
                "value":{{"bpmnProcessId":"order","version":3,"processDefinitionKey":7,
                "processInstanceKey":100,"elementId":"order-flow",
                "bpmnElementType":"SERVICE_TASK"}}}}"#,
            i64::MAX
        )
        .as_bytes(),
    )
    .unwrap();
    dispatcher.dispatch("process-instance", &record).unwrap();

    let calls = store.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(
        &calls[0],
        Call::AuditLog(entry) if entry.timestamp == i64::MAX && entry.position == 6
    ));
}

#[test]
fn test_incident_created_and_resolved() {
    let (dispatcher, store) = setup(RecordingStore::default());

    let created = event(
        "INCIDENT",
        "CREATED",
        77,
        40,
        r#"{"errorType":"JOB_NO_RETRIES","errorMessage":"card declined",
            "processInstanceKey":100,"elementId":"charge","jobKey":42}"#,
    );
    let resolved = event(
        "INCIDENT",
        "RESOLVED",
        77,
        41,
        r#"{"errorType":"JOB_NO_RETRIES","processInstanceKey":100,"elementId":"charge"}"#,
    );
    dispatcher.dispatch("incident", &created).unwrap();
    dispatcher.dispatch("incident", &resolved).unwrap();

    assert_eq!(
        store.calls(),
        vec![
            Call::IncidentCreated(NewIncident {
                key: 77,
                instance_key: 100,
                element_id: "charge".into(),
                error_type: "JOB_NO_RETRIES".into(),
                error_message: "card declined".into(),
                time: at(TIMESTAMP),
            }),
            Call::IncidentResolved(77, at(TIMESTAMP)),
        ]
    );
}

#[test]
fn test_job_created_then_updated_with_intent_as_state() {
    let (dispatcher, store) = setup(RecordingStore::default());

    dispatcher.dispatch("job", &job("CREATED", 3, "")).unwrap();
    dispatcher.dispatch("job", &job("FAILED", 2, "worker-1")).unwrap();

    assert_eq!(
        store.calls(),
        vec![
            Call::JobCreated(NewJob {
                key: 42,
                instance_key: 100,
                element_id: "charge".into(),
                job_type: "payment".into(),
                worker: String::new(),
                retries: 3,
                time: at(TIMESTAMP),
            }),
            Call::JobUpdated {
                key: 42,
                retries: 2,
                worker: "worker-1".into(),
                state: "FAILED".into(),
                time: at(TIMESTAMP),
            },
        ]
    );
}

#[test]
fn test_store_failure_is_returned() {
    let (dispatcher, store) = setup(RecordingStore {
        fail_mutations: true,
        ..Default::default()
    });

    let err = dispatcher.dispatch("job", &job("CREATED", 3, "")).unwrap_err();

    assert!(matches!(err, ProcmonError::Store(StoreError::Database(_))));
    assert_eq!(store.calls().len(), 1);
}

#[test]
fn test_cast_failure_is_returned() {
    let (dispatcher, store) = setup(RecordingStore::default());

    // Missing required `retries`
    let record = event(
        "JOB",
        "CREATED",
        1,
        1,
        r#"{"type":"payment","elementId":"charge","processInstanceKey":1}"#,
    );
    let err = dispatcher.dispatch("job", &record).unwrap_err();

    assert!(matches!(err, ProcmonError::Cast { .. }));
    assert!(store.calls().is_empty());
}

#[test]
fn test_deployment_persists_each_process() {
    let (dispatcher, store) = setup(RecordingStore::default());

    let record = deployment(
        &format!(
            r#"{{"resourceName":"order.bpmn","resource":"{BPMN_B64}"}},
               {{"resourceName":"refund.bpmn","resource":"{BPMN_B64}"}}"#
        ),
        &format!("{},{}", metadata(1, "order.bpmn"), metadata(2, "refund.bpmn")),
    );
    dispatcher.dispatch("deployment", &record).unwrap();

    let calls = store.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(
        calls[0],
        Call::ProcessDeployed(DeployedProcess {
            definition_key: 1,
            bpmn_process_id: "order".into(),
            version: 1,
            deployment_time: at(TIMESTAMP),
            resource: b"<bpmn/>".to_vec(),
        })
    );
    assert!(matches!(&calls[1], Call::ProcessDeployed(p) if p.definition_key == 2));
}

#[test]
fn test_deployment_missing_resource_continues_with_other_entries() {
    let (dispatcher, store) = setup(RecordingStore::default());

    let record = deployment(
        &format!(r#"{{"resourceName":"order.bpmn","resource":"{BPMN_B64}"}}"#),
        &format!("{},{}", metadata(1, "missing.bpmn"), metadata(2, "order.bpmn")),
    );
    let err = dispatcher.dispatch("deployment", &record).unwrap_err();

    assert!(err.to_string().contains("missing.bpmn"));
    let calls = store.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(&calls[0], Call::ProcessDeployed(p) if p.definition_key == 2));
}

#[test]
fn test_deployment_failures_are_aggregated() {
    let (dispatcher, store) = setup(RecordingStore::default());

    let record = deployment(
        r#"{"resourceName":"bad.bpmn","resource":"***not base64***"}"#,
        &format!("{},{}", metadata(1, "missing.bpmn"), metadata(2, "bad.bpmn")),
    );
    let err = dispatcher.dispatch("deployment", &record).unwrap_err();

    match err {
        ProcmonError::Aggregate(errors) => assert_eq!(errors.len(), 2),
        other => panic!("expected aggregate error, got {other}"),
    }
    assert!(store.calls().is_empty());
}

#[test]
fn test_redeploy_same_definition_key_fails_with_sqlite() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = procmon_sqlite::SqliteStateStore::open(procmon_core::StoreConfig::new(
        temp_dir.path().join("state.db"),
    ))
    .unwrap();
    let dispatcher = Dispatcher::with_default_handlers(Arc::new(store));

    let record = deployment(
        &format!(r#"{{"resourceName":"order.bpmn","resource":"{BPMN_B64}"}}"#),
        &metadata(1, "order.bpmn"),
    );
    dispatcher.dispatch("deployment", &record).unwrap();

    let err = dispatcher.dispatch("deployment", &record).unwrap_err();
    assert!(err.is_already_exists());
}

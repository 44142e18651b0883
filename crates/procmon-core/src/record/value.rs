//! Typed payloads, one per projected value type.

use crate::types::ValueType;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Open key/value bag for dynamically shaped JSON (custom headers, variable
/// documents). Never coerced to a fixed schema.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// A payload schema bound to the value type that carries it.
pub trait RecordValue: DeserializeOwned {
    const VALUE_TYPE: ValueType;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobValue {
    #[serde(rename = "type")]
    pub job_type: String,
    pub element_id: String,
    #[serde(default)]
    pub element_instance_key: i64,
    #[serde(default)]
    pub bpmn_process_id: String,
    #[serde(default)]
    pub process_definition_version: i64,
    #[serde(default)]
    pub process_definition_key: i64,
    pub process_instance_key: i64,
    #[serde(default)]
    pub custom_headers: Document,
    #[serde(default)]
    pub worker: String,
    pub retries: i64,
    #[serde(default)]
    pub retry_backoff: i64,
    #[serde(default)]
    pub recurring_time: i64,
    #[serde(default)]
    pub deadline: i64,
    #[serde(default)]
    pub timeout: i64,
    #[serde(default)]
    pub variables: Document,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub tenant_id: String,
}

impl RecordValue for JobValue {
    const VALUE_TYPE: ValueType = ValueType::Job;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInstanceValue {
    pub bpmn_process_id: String,
    pub version: i64,
    pub process_definition_key: i64,
    pub process_instance_key: i64,
    pub element_id: String,
    #[serde(default)]
    pub flow_scope_key: i64,
    pub bpmn_element_type: String,
    #[serde(default)]
    pub bpmn_event_type: String,
    #[serde(default)]
    pub parent_process_instance_key: i64,
    #[serde(default)]
    pub parent_element_instance_key: i64,
    #[serde(default)]
    pub tenant_id: String,
}

impl RecordValue for ProcessInstanceValue {
    const VALUE_TYPE: ValueType = ValueType::ProcessInstance;
}

/// Variable payload. `value` holds the JSON-encoded variable value as a
/// string, exactly as the broker sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableValue {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub scope_key: i64,
    pub process_instance_key: i64,
    #[serde(default)]
    pub process_definition_key: i64,
    #[serde(default)]
    pub bpmn_process_id: String,
    #[serde(default)]
    pub tenant_id: String,
}

impl RecordValue for VariableValue {
    const VALUE_TYPE: ValueType = ValueType::Variable;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentValue {
    pub error_type: String,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub bpmn_process_id: String,
    #[serde(default)]
    pub process_definition_key: i64,
    pub process_instance_key: i64,
    pub element_id: String,
    #[serde(default)]
    pub element_instance_key: i64,
    #[serde(default)]
    pub job_key: i64,
    #[serde(default)]
    pub variable_scope_key: i64,
    #[serde(default)]
    pub tenant_id: String,
}

impl RecordValue for IncidentValue {
    const VALUE_TYPE: ValueType = ValueType::Incident;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResource {
    pub resource_name: String,
    /// Base64-encoded resource content.
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMetadata {
    pub bpmn_process_id: String,
    pub version: i64,
    pub process_definition_key: i64,
    pub resource_name: String,
    #[serde(default)]
    pub checksum: String,
    #[serde(default)]
    pub duplicate: bool,
    #[serde(default)]
    pub tenant_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentValue {
    #[serde(default)]
    pub resources: Vec<DeploymentResource>,
    #[serde(default)]
    pub processes_metadata: Vec<ProcessMetadata>,
    #[serde(default)]
    pub decisions_metadata: Vec<Document>,
    #[serde(default)]
    pub decision_requirements_metadata: Vec<Document>,
    #[serde(default)]
    pub tenant_id: String,
}

impl DeploymentValue {
    /// Look up a deployed resource by name.
    pub fn resource(&self, name: &str) -> Option<&DeploymentResource> {
        self.resources.iter().find(|r| r.resource_name == name)
    }
}

impl RecordValue for DeploymentValue {
    const VALUE_TYPE: ValueType = ValueType::Deployment;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessValue {
    pub bpmn_process_id: String,
    pub version: i64,
    pub process_definition_key: i64,
    #[serde(default)]
    pub resource_name: String,
    #[serde(default)]
    pub checksum: String,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub tenant_id: String,
}

impl RecordValue for ProcessValue {
    const VALUE_TYPE: ValueType = ValueType::Process;
}

/// Closed union of every payload this build understands.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordPayload {
    Deployment(DeploymentValue),
    Process(ProcessValue),
    ProcessInstance(ProcessInstanceValue),
    Variable(VariableValue),
    Incident(IncidentValue),
    Job(JobValue),
    /// A value type this build does not model; carries its name.
    Unknown(String),
}

impl RecordPayload {
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            RecordPayload::Deployment(_) => Some(ValueType::Deployment),
            RecordPayload::Process(_) => Some(ValueType::Process),
            RecordPayload::ProcessInstance(_) => Some(ValueType::ProcessInstance),
            RecordPayload::Variable(_) => Some(ValueType::Variable),
            RecordPayload::Incident(_) => Some(ValueType::Incident),
            RecordPayload::Job(_) => Some(ValueType::Job),
            RecordPayload::Unknown(_) => None,
        }
    }
}

//! Rows of the projected workflow snapshot.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceStatus {
    Active,
    Completed,
    Terminated,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Active => "ACTIVE",
            InstanceStatus::Completed => "COMPLETED",
            InstanceStatus::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(InstanceStatus::Active),
            "COMPLETED" => Ok(InstanceStatus::Completed),
            "TERMINATED" => Ok(InstanceStatus::Terminated),
            other => Err(format!("unknown instance status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pub definition_key: i64,
    pub bpmn_process_id: String,
    pub version: i64,
    pub deployment_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub instance_key: i64,
    pub definition_key: i64,
    pub version: i64,
    pub status: InstanceStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub instance_key: i64,
    pub name: String,
    pub value: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incident {
    pub key: i64,
    pub instance_key: i64,
    pub element_id: String,
    pub error_type: String,
    pub error_message: String,
    pub state: String,
    pub time: DateTime<Utc>,
    pub resolve_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub key: i64,
    pub element_id: String,
    pub instance_key: i64,
    pub job_type: String,
    pub retries: i64,
    pub worker: String,
    pub state: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogRow {
    pub partition_id: i64,
    pub position: i64,
    pub instance_key: i64,
    pub element_id: String,
    pub element_type: String,
    pub intent: String,
    pub timestamp: i64,
}

/// Row counts per table, for status reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub processes: u64,
    pub instances: u64,
    pub active_instances: u64,
    pub variables: u64,
    pub incidents: u64,
    pub open_incidents: u64,
    pub jobs: u64,
    pub audit_log: u64,
}

//! Envelope vocabulary: value types, topics, record and rejection types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Value types this build projects.
///
/// The envelope keeps the raw value type string so that records of value
/// types not listed here still decode; [`ValueType::parse`] returns `None`
/// for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    Deployment,
    Process,
    ProcessInstance,
    Variable,
    Incident,
    Job,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Deployment => "DEPLOYMENT",
            ValueType::Process => "PROCESS",
            ValueType::ProcessInstance => "PROCESS_INSTANCE",
            ValueType::Variable => "VARIABLE",
            ValueType::Incident => "INCIDENT",
            ValueType::Job => "JOB",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DEPLOYMENT" => Some(ValueType::Deployment),
            "PROCESS" => Some(ValueType::Process),
            "PROCESS_INSTANCE" => Some(ValueType::ProcessInstance),
            "VARIABLE" => Some(ValueType::Variable),
            "INCIDENT" => Some(ValueType::Incident),
            "JOB" => Some(ValueType::Job),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A subscribed stream topic. Each topic carries records of one value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    Deployment,
    Process,
    ProcessInstance,
    Variable,
    Incident,
    Job,
}

impl Topic {
    pub const ALL: [Topic; 6] = [
        Topic::Deployment,
        Topic::Process,
        Topic::ProcessInstance,
        Topic::Variable,
        Topic::Incident,
        Topic::Job,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Topic::Deployment => "deployment",
            Topic::Process => "process",
            Topic::ProcessInstance => "process-instance",
            Topic::Variable => "variable",
            Topic::Incident => "incident",
            Topic::Job => "job",
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Topic::Deployment => ValueType::Deployment,
            Topic::Process => ValueType::Process,
            Topic::ProcessInstance => ValueType::ProcessInstance,
            Topic::Variable => ValueType::Variable,
            Topic::Incident => ValueType::Incident,
            Topic::Job => ValueType::Job,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .iter()
            .find(|t| t.name() == s)
            .copied()
            .ok_or_else(|| format!("unknown topic '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordType {
    Command,
    Event,
    CommandRejection,
    SbeUnknown,
    NullVal,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionType {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    InvalidState,
    ProcessingError,
    ExceededBatchRecordSize,
    Unauthorized,
    Forbidden,
    SbeUnknown,
    #[default]
    NullVal,
    #[serde(other)]
    Unknown,
}

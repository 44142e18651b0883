//! Record envelope and two-phase decoding
//!
//! Every message on a topic is a JSON envelope:
//! - **Header**: value type, intent, record type, rejection info, key,
//!   position, timestamp, partition, broker version
//! - **Value**: payload whose shape depends on the value type
//!
//! Decoding happens in two phases. [`Record::decode`] parses the header and
//! keeps the value as raw JSON. A handler then calls [`Record::cast`] with the
//! payload schema it expects, which re-parses only the value region.
//!
//! # Example
//!
//! ```
//! use procmon_core::record::{JobValue, Record};
//!
//! # fn main() -> procmon_core::Result<()> {
//! let bytes = br#"{
//!     "valueType": "JOB", "intent": "CREATED", "recordType": "EVENT",
//!     "partitionId": 1, "key": 7, "position": 42, "timestamp": 1700000000000,
//!     "value": {"type": "payment", "elementId": "charge",
//!               "processInstanceKey": 3, "retries": 3}
//! }"#;
//!
//! let record = Record::decode(bytes)?;
//! let job = record.cast::<JobValue>()?;
//! assert_eq!(job.value.job_type, "payment");
//! assert_eq!(job.position, 42);
//! # Ok(())
//! # }
//! ```

pub mod value;

pub use value::{
    DeploymentResource, DeploymentValue, Document, IncidentValue, JobValue, ProcessInstanceValue,
    ProcessMetadata, ProcessValue, RecordPayload, RecordValue, VariableValue,
};

use crate::error::{ProcmonError, Result};
use crate::types::{RecordType, RejectionType, ValueType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::ops::Deref;

/// Decoded envelope with an un-decoded payload region.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Raw value type name. Kept as a string so unknown value types decode.
    #[serde(default)]
    pub value_type: String,
    pub intent: String,
    pub record_type: RecordType,
    #[serde(default)]
    pub rejection_type: RejectionType,
    #[serde(default)]
    pub rejection_reason: String,
    pub partition_id: i64,
    pub key: i64,
    pub position: i64,
    #[serde(default = "default_source_record_position")]
    pub source_record_position: i64,
    /// Epoch milliseconds
    pub timestamp: i64,
    #[serde(default)]
    pub broker_version: String,
    pub value: Box<RawValue>,
}

fn default_source_record_position() -> i64 {
    -1
}

impl Record {
    /// Parse raw message bytes into an envelope.
    ///
    /// Fails with [`ProcmonError::Decode`] on malformed JSON or mistyped
    /// header fields, and with [`ProcmonError::MissingValueType`] when the
    /// value type is absent or empty.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let record: Record = serde_json::from_slice(bytes).map_err(ProcmonError::Decode)?;
        if record.value_type.is_empty() {
            return Err(ProcmonError::MissingValueType);
        }
        Ok(record)
    }

    /// Encode back to JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ProcmonError::Serialization(e.to_string()))
    }

    /// Decode the payload region as `V`.
    ///
    /// The declared value type must match `V::VALUE_TYPE`; no coercion is
    /// attempted across value types.
    pub fn cast<V: RecordValue>(&self) -> Result<TypedRecord<'_, V>> {
        let expected = V::VALUE_TYPE.as_str();
        if self.value_type != expected {
            return Err(ProcmonError::ValueTypeMismatch {
                expected,
                actual: self.value_type.clone(),
            });
        }

        let value =
            serde_json::from_str(self.value.get()).map_err(|source| ProcmonError::Cast {
                value_type: self.value_type.clone(),
                source,
            })?;

        Ok(TypedRecord {
            record: self,
            value,
        })
    }

    /// Decode the payload into the closed [`RecordPayload`] union.
    pub fn payload(&self) -> Result<RecordPayload> {
        let Some(value_type) = ValueType::parse(&self.value_type) else {
            return Ok(RecordPayload::Unknown(self.value_type.clone()));
        };

        let payload = match value_type {
            ValueType::Deployment => RecordPayload::Deployment(self.cast()?.value),
            ValueType::Process => RecordPayload::Process(self.cast()?.value),
            ValueType::ProcessInstance => RecordPayload::ProcessInstance(self.cast()?.value),
            ValueType::Variable => RecordPayload::Variable(self.cast()?.value),
            ValueType::Incident => RecordPayload::Incident(self.cast()?.value),
            ValueType::Job => RecordPayload::Job(self.cast()?.value),
        };
        Ok(payload)
    }

    /// Record timestamp as a UTC instant.
    pub fn time(&self) -> Result<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
            .ok_or(ProcmonError::InvalidTimestamp(self.timestamp))
    }

    pub fn is_event(&self) -> bool {
        self.record_type == RecordType::Event
    }
}

/// A record paired with its decoded payload.
///
/// Dereferences to the envelope, so header fields read as `typed.key`.
#[derive(Debug)]
pub struct TypedRecord<'a, V> {
    pub record: &'a Record,
    pub value: V,
}

impl<V> Deref for TypedRecord<'_, V> {
    type Target = Record;

    fn deref(&self) -> &Record {
        self.record
    }
}

//! procmon core: envelope codec, typed payloads and the seams of the
//! projection pipeline
//!
//! This crate defines the pieces every other procmon crate builds on:
//! - Record envelope with two-phase decoding (header, then typed payload)
//! - Value-type, topic and intent vocabulary
//! - Error taxonomy for decode, cast and store failures
//! - `StateStore`: mutation contract of the projected workflow snapshot
//! - `StreamSource`/`TopicStream`: per-topic ordered byte streams
//! - Immutable configuration values

pub mod config;
pub mod error;
pub mod intent;
pub mod observe;
pub mod record;
pub mod traits;
pub mod types;

pub use config::{ProcmonConfig, RouterConfig, StartPosition, StoreConfig, SynchronousMode};
pub use error::{ProcmonError, Result, StoreError, StoreResult};
pub use record::{Record, RecordPayload, RecordValue, TypedRecord};
pub use traits::{
    AuditLogEntry, DeployedProcess, NewIncident, NewJob, StateStore, StreamSource, TopicStream,
};
pub use types::{RecordType, RejectionType, Topic, ValueType};

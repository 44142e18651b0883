pub mod state_store;
pub mod stream;

pub use state_store::{AuditLogEntry, DeployedProcess, NewIncident, NewJob, StateStore};
pub use stream::{StreamSource, TopicStream};

//! SQLite-backed state store for procmon projections
//!
//! Persists the workflow snapshot derived from broker records:
//! - Deployed processes and their BPMN resources
//! - Process instances with lifecycle status
//! - Variables, incidents and jobs
//! - A per-instance audit log of element transitions
//!
//! Times are stored as epoch milliseconds; WAL mode is enabled by default.

pub mod model;
pub mod schema;
pub mod store;

pub use model::{
    AuditLogRow, Incident, Instance, InstanceStatus, Job, Process, StoreCounts, Variable,
};
pub use store::SqliteStateStore;

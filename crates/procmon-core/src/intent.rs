//! Intent and element-type names as they appear on the wire.
//!
//! Intents are kept as strings on the envelope so that intents introduced by
//! newer brokers still decode; handlers match on these constants and log
//! anything else.

pub mod deployment {
    pub const CREATE: &str = "CREATE";
    pub const CREATED: &str = "CREATED";
    pub const DISTRIBUTE: &str = "DISTRIBUTE";
    pub const DISTRIBUTED: &str = "DISTRIBUTED";
    pub const FULLY_DISTRIBUTED: &str = "FULLY_DISTRIBUTED";
}

pub mod process {
    pub const CREATED: &str = "CREATED";
    pub const DELETING: &str = "DELETING";
    pub const DELETED: &str = "DELETED";
}

pub mod process_instance {
    pub const ELEMENT_ACTIVATING: &str = "ELEMENT_ACTIVATING";
    pub const ELEMENT_ACTIVATED: &str = "ELEMENT_ACTIVATED";
    pub const ELEMENT_COMPLETING: &str = "ELEMENT_COMPLETING";
    pub const ELEMENT_COMPLETED: &str = "ELEMENT_COMPLETED";
    pub const ELEMENT_TERMINATING: &str = "ELEMENT_TERMINATING";
    pub const ELEMENT_TERMINATED: &str = "ELEMENT_TERMINATED";
    pub const SEQUENCE_FLOW_TAKEN: &str = "SEQUENCE_FLOW_TAKEN";
}

pub mod variable {
    pub const CREATED: &str = "CREATED";
    pub const UPDATED: &str = "UPDATED";
    pub const MIGRATED: &str = "MIGRATED";
}

pub mod incident {
    pub const CREATED: &str = "CREATED";
    pub const RESOLVED: &str = "RESOLVED";
    pub const MIGRATED: &str = "MIGRATED";
}

pub mod job {
    pub const CREATED: &str = "CREATED";
    pub const COMPLETED: &str = "COMPLETED";
    pub const TIMED_OUT: &str = "TIMED_OUT";
    pub const FAILED: &str = "FAILED";
    pub const RETRIES_UPDATED: &str = "RETRIES_UPDATED";
    pub const CANCELED: &str = "CANCELED";
    pub const ERROR_THROWN: &str = "ERROR_THROWN";
    pub const RECURRED_AFTER_BACKOFF: &str = "RECURRED_AFTER_BACKOFF";
    pub const YIELDED: &str = "YIELDED";
    pub const TIMEOUT_UPDATED: &str = "TIMEOUT_UPDATED";
    pub const MIGRATED: &str = "MIGRATED";
}

/// `bpmnElementType` values of process-instance records.
pub mod element_type {
    pub const PROCESS: &str = "PROCESS";
    pub const SUB_PROCESS: &str = "SUB_PROCESS";
    pub const START_EVENT: &str = "START_EVENT";
    pub const END_EVENT: &str = "END_EVENT";
    pub const SERVICE_TASK: &str = "SERVICE_TASK";
    pub const USER_TASK: &str = "USER_TASK";
    pub const SEQUENCE_FLOW: &str = "SEQUENCE_FLOW";
}

/// Incident states written by the store.
pub mod incident_state {
    pub const CREATED: &str = "CREATED";
    pub const RESOLVED: &str = "RESOLVED";
}

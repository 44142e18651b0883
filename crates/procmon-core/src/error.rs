use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcmonError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Envelope decode error: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Record is missing a value type")]
    MissingValueType,

    #[error("Cannot cast {actual} record to {expected}")]
    ValueTypeMismatch {
        expected: &'static str,
        actual: String,
    },

    #[error("Failed to decode {value_type} payload: {source}")]
    Cast {
        value_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Timestamp {0} is out of range")]
    InvalidTimestamp(i64),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{} entries failed: {}", .0.len(), join_errors(.0))]
    Aggregate(Vec<ProcmonError>),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Failures reported by a [`StateStore`](crate::traits::StateStore) mutation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl ProcmonError {
    /// Collapse a list of per-entry failures into a single error.
    ///
    /// Returns `Ok(())` when the list is empty and the lone error when there
    /// is exactly one.
    pub fn aggregate(mut errors: Vec<ProcmonError>) -> Result<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ProcmonError::Aggregate(errors)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ProcmonError::Store(StoreError::NotFound(_)))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, ProcmonError::Store(StoreError::AlreadyExists(_)))
    }
}

fn join_errors(errors: &[ProcmonError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, ProcmonError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;

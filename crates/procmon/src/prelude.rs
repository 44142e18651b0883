//! procmon prelude
//!
//! Import this to get all commonly used types and traits:
//!
//! ```
//! use procmon::prelude::*;
//! ```

// Core types
pub use crate::{ProcmonError, Record, RecordPayload, Result, StoreError, Topic, TypedRecord};

// Configs
pub use crate::{ProcmonConfig, RouterConfig, StartPosition, StoreConfig, SynchronousMode};

// Traits
pub use crate::{RecordValue, StateStore, StreamSource, TopicHandler, TopicStream};

// Implementations
pub use crate::{ChannelSource, Dispatcher, FileSource, Procmon, SqliteStateStore, TopicRouter};

// Router
pub use crate::{RouterStats, ShutdownHandle, WorkerStats};

// Re-export common external deps
pub use serde::{Deserialize, Serialize};
pub use std::sync::Arc;
pub use tracing;

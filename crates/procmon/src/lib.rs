//! procmon: projects workflow-engine records into a queryable snapshot
//!
//! procmon consumes the broker's per-topic record streams and keeps a SQLite
//! database of deployed processes, process instances, variables, incidents,
//! jobs and an element-level audit log:
//! - **Topic router**: one worker per topic, strictly ordered within a topic
//! - **Dispatcher**: routes each record to its topic handler
//! - **State store**: SQLite tables updated by the handlers
//! - **Stream sources**: in-process channels or tailed NDJSON files
//!
//! # Quick Start
//!
//! ```no_run
//! use procmon::prelude::*;
//! use procmon::stream::FileSource;
//!
//! # async fn run() -> Result<()> {
//! let config = ProcmonConfig::default();
//! let procmon = Procmon::open(config)?;
//!
//! let router = procmon.start(Arc::new(FileSource::new("./topics"))).await?;
//! tokio::signal::ctrl_c().await?;
//! let stats = router.shutdown_and_join().await?;
//! println!("applied {} records", stats.total().applied);
//! # Ok(())
//! # }
//! ```

pub mod monitor;
pub mod prelude;
pub mod router;
pub mod stream;

// Re-export core types
pub use procmon_core::{
    config::{ProcmonConfig, RouterConfig, StartPosition, StoreConfig, SynchronousMode},
    error::{ProcmonError, Result, StoreError, StoreResult},
    record::{Record, RecordPayload, RecordValue, TypedRecord},
    traits::{
        AuditLogEntry, DeployedProcess, NewIncident, NewJob, StateStore, StreamSource,
        TopicStream,
    },
    types::{RecordType, RejectionType, Topic, ValueType},
};

// Re-export implementations
pub use procmon_projector::{Dispatcher, TopicHandler};
pub use procmon_sqlite::{InstanceStatus, SqliteStateStore, StoreCounts};

// Re-export main types from this crate
pub use monitor::Procmon;
pub use router::{RouterStats, ShutdownHandle, TopicRouter, WorkerStats};
pub use stream::{ChannelSource, FileSource};

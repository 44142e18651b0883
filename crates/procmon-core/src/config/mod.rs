pub mod router;
pub mod store;

pub use router::{RouterConfig, StartPosition};
pub use store::{StoreConfig, SynchronousMode};

use crate::error::{ProcmonError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration, built once at startup and passed down by
/// reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcmonConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub router: RouterConfig,
}

impl ProcmonConfig {
    /// Load configuration from a JSON file. Missing fields take their
    /// defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ProcmonError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.router.topics.is_empty() {
            return Err(ProcmonError::Config("no topics configured".into()));
        }
        if self.router.poll_interval_ms == 0 {
            return Err(ProcmonError::Config(
                "poll_interval_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

//! Unified procmon interface
//!
//! Bundles the state store, the dispatcher with its default handlers and the
//! router configuration.

use crate::router::TopicRouter;
use procmon_core::{ProcmonConfig, Result, StateStore, StreamSource};
use procmon_projector::Dispatcher;
use procmon_sqlite::SqliteStateStore;
use std::sync::Arc;

pub struct Procmon {
    store: Arc<SqliteStateStore>,
    dispatcher: Arc<Dispatcher>,
    config: ProcmonConfig,
}

impl Procmon {
    /// Validate `config` and open the state store it names.
    pub fn open(config: ProcmonConfig) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(SqliteStateStore::open(config.store.clone())?);
        let dispatcher = Arc::new(Dispatcher::with_default_handlers(
            store.clone() as Arc<dyn StateStore>
        ));

        Ok(Self {
            store,
            dispatcher,
            config,
        })
    }

    pub fn store(&self) -> &Arc<SqliteStateStore> {
        &self.store
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn config(&self) -> &ProcmonConfig {
        &self.config
    }

    /// Start routing every configured topic of `source`.
    pub async fn start(&self, source: Arc<dyn StreamSource>) -> Result<TopicRouter> {
        TopicRouter::start(source, self.dispatcher.clone(), &self.config.router).await
    }
}

//! Topic handler registry
//!
//! Routes decoded records to the handler registered for their topic.
//!
//! # Example
//!
//! ```
//! use procmon_core::{Record, Result};
//! use procmon_projector::{Dispatcher, TopicHandler};
//!
//! struct TimerHandler;
//!
//! impl TopicHandler for TimerHandler {
//!     fn topic(&self) -> &str {
//!         "timer"
//!     }
//!
//!     fn handle(&self, record: &Record) -> Result<()> {
//!         println!("timer {} at {}", record.intent, record.position);
//!         Ok(())
//!     }
//! }
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.register(Box::new(TimerHandler));
//! assert_eq!(dispatcher.topics(), vec!["timer"]);
//! ```

use crate::handlers::{
    DeploymentHandler, IncidentHandler, JobHandler, ProcessHandler, ProcessInstanceHandler,
    VariableHandler,
};
use procmon_core::{ProcmonError, Record, Result, StateStore};
use std::collections::HashMap;
use std::sync::Arc;

/// Projects the records of one topic onto the state store.
pub trait TopicHandler: Send + Sync {
    /// Topic name this handler consumes (e.g. "job", "process-instance")
    fn topic(&self) -> &str;

    /// Apply one record, whatever its record type.
    ///
    /// Intents the handler does not recognise are logged and treated as
    /// success.
    fn handle(&self, record: &Record) -> Result<()>;
}

/// Topic handler registry
pub struct Dispatcher {
    handlers: HashMap<String, Box<dyn TopicHandler>>,
}

impl Dispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Dispatcher with the six built-in handlers writing to `store`.
    pub fn with_default_handlers(store: Arc<dyn StateStore>) -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(Box::new(DeploymentHandler::new(store.clone())));
        dispatcher.register(Box::new(ProcessHandler::new()));
        dispatcher.register(Box::new(ProcessInstanceHandler::new(store.clone())));
        dispatcher.register(Box::new(VariableHandler::new(store.clone())));
        dispatcher.register(Box::new(IncidentHandler::new(store.clone())));
        dispatcher.register(Box::new(JobHandler::new(store)));
        dispatcher
    }

    /// Register a topic handler
    ///
    /// Panics if a handler for the same topic is already registered.
    pub fn register(&mut self, handler: Box<dyn TopicHandler>) {
        let topic = handler.topic().to_string();
        if self.handlers.contains_key(&topic) {
            panic!("Handler for topic '{}' already registered", topic);
        }
        self.handlers.insert(topic, handler);
    }

    /// Try to register a handler, returning error if already registered
    pub fn try_register(&mut self, handler: Box<dyn TopicHandler>) -> Result<()> {
        let topic = handler.topic().to_string();
        if self.handlers.contains_key(&topic) {
            return Err(ProcmonError::InvalidState(format!(
                "Handler for topic '{}' already registered",
                topic
            )));
        }
        self.handlers.insert(topic, handler);
        Ok(())
    }

    pub fn get(&self, topic: &str) -> Option<&dyn TopicHandler> {
        self.handlers.get(topic).map(|h| h.as_ref())
    }

    /// Route a record to the handler of `topic`.
    ///
    /// Commands and rejections are routed like events, on topic and intent
    /// alone. Unknown topics are logged and skipped with `Ok(())`; no store
    /// call is made for them.
    pub fn dispatch(&self, topic: &str, record: &Record) -> Result<()> {
        let Some(handler) = self.get(topic) else {
            tracing::warn!(
                topic,
                value_type = %record.value_type,
                intent = %record.intent,
                "No handler for topic, skipping record"
            );
            return Ok(());
        };

        tracing::trace!(
            topic,
            record_type = ?record.record_type,
            intent = %record.intent,
            position = record.position,
            "Dispatching record"
        );
        handler.handle(record)
    }

    /// List all registered topics, sorted
    pub fn topics(&self) -> Vec<&str> {
        let mut topics: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        topics.sort_unstable();
        topics
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

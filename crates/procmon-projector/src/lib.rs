//! Projection of broker records onto the procmon state store
//!
//! A [`Dispatcher`] routes each decoded record by topic name to a
//! [`TopicHandler`]. The built-in handlers cast the payload, pick the store
//! mutation for the record's intent and apply it:
//! - `deployment`: persist deployed process definitions and BPMN resources
//! - `process`: logged only
//! - `process-instance`: audit log plus instance lifecycle
//! - `variable`, `incident`, `job`: create and update their rows

pub mod dispatcher;
pub mod handlers;

pub use dispatcher::{Dispatcher, TopicHandler};

//! Red Zone rule engine.
//!
//! This crate provides:
//! - YAML/JSON rule documents with serde deserialization
//! - Authoring-time validation with path-located errors and suggestions
//! - A condition evaluator over two-level AND/OR rule expressions
//! - Alert lifecycle tracking with manual and automatic resolution
//! - Batch scanning of customer records across the rule set
//! - Filesystem loader with hot-reload via `notify` watcher

pub mod audit_log;
pub mod engine;
pub mod evaluator;
pub mod lifecycle;
pub mod loader;
pub mod schema;
pub mod validation;

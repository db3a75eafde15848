//! Filesystem rule loader with hot-reload via `notify` watcher.
//!
//! Loads Red Zone rules and field catalog documents from YAML or JSON files
//! using two-pass deserialization (RuleEnvelope -> RuleDocument). Documents
//! are validated on load; invalid ones are reported and never enter the
//! in-memory set. The watcher reloads files as they change.

mod core;
mod error;
mod watcher;


pub use self::core::{load_catalog, parse_document, RuleLoader};
pub use self::error::{LoadResult, LoadStatus, Result, RuleError};

//! Error types and load result structures for the rule loader.

use std::path::PathBuf;

use serde::Serialize;

use crate::validation::SchemaError;

/// Errors that can occur during rule loading and management.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (or JSON, parsed as YAML) deserialization error.
    #[error("parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Document parsed but failed validation.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("invalid document: {0}")]
    Invalid(String),

    #[error("no rule file found for id '{0}'")]
    NotFound(String),

    #[error("notify watcher error: {0}")]
    Notify(#[from] notify::Error),
}

pub type Result<T> = std::result::Result<T, RuleError>;

/// Outcome of loading a single file.
#[derive(Debug, Serialize)]
pub struct LoadResult {
    pub path: PathBuf,
    pub status: LoadStatus,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    Loaded { rule_id: String },
    /// Dotfile or unsupported extension.
    Skipped { reason: String },
    /// Parse or validation error.
    Failed { error: String },
}

impl LoadResult {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, LoadStatus::Failed { .. })
    }
}

//! In-memory audit log of rule evaluation and alert transitions.
//!
//! Entries are kept per rule, capped at a configurable maximum (default 500)
//! with FIFO eviction. Uses `std::sync::RwLock` so the log can be shared with
//! rayon workers and async callers alike.

use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ENTRIES_PER_RULE: usize = 500;

/// Severity level for audit log entries. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// What the engine was doing when the entry was written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    Validation,
    Evaluation,
    AlertRaised,
    AutoResolve,
    ManualResolve,
    Complete,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub rule_id: String,
    pub level: LogLevel,
    pub phase: ExecutionPhase,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Filters for [`AuditLog::query`]. All fields optional.
#[derive(Debug, Default, Deserialize)]
pub struct LogQueryParams {
    /// Minimum level, inclusive.
    pub level: Option<LogLevel>,
    pub phase: Option<ExecutionPhase>,
    /// Defaults to 100.
    pub limit: Option<usize>,
    /// Only entries at or after this instant.
    pub since: Option<DateTime<Utc>>,
}

/// Per-rule audit log with FIFO eviction.
pub struct AuditLog {
    entries: RwLock<HashMap<String, VecDeque<LogEntry>>>,
    max_entries_per_rule: usize,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES_PER_RULE)
    }

    pub fn with_max_entries(max: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries_per_rule: max.max(1),
        }
    }

    pub fn log(
        &self,
        rule_id: &str,
        level: LogLevel,
        phase: ExecutionPhase,
        message: impl Into<String>,
    ) {
        self.log_with_details(rule_id, level, phase, message, None);
    }

    pub fn log_with_details(
        &self,
        rule_id: &str,
        level: LogLevel,
        phase: ExecutionPhase,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) {
        let entry = LogEntry {
            timestamp: Utc::now(),
            rule_id: rule_id.to_string(),
            level,
            phase,
            message: message.into(),
            details,
        };

        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let deque = guard.entry(rule_id.to_string()).or_default();
        deque.push_back(entry);
        while deque.len() > self.max_entries_per_rule {
            deque.pop_front();
        }
    }

    /// Entries for a rule matching `params`, newest first.
    pub fn query(&self, rule_id: &str, params: &LogQueryParams) -> Vec<LogEntry> {
        let guard = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let Some(deque) = guard.get(rule_id) else {
            return Vec::new();
        };

        deque
            .iter()
            .rev()
            .filter(|e| params.level.map_or(true, |min| e.level >= min))
            .filter(|e| params.phase.map_or(true, |p| e.phase == p))
            .filter(|e| params.since.map_or(true, |s| e.timestamp >= s))
            .take(params.limit.unwrap_or(100))
            .cloned()
            .collect()
    }

    /// Rule ids with at least one entry, sorted.
    pub fn rule_ids(&self) -> Vec<String> {
        let guard = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = guard.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn clear(&self, rule_id: &str) {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        guard.remove(rule_id);
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

//! Batch scanning of customer records against the Red Zone rule set.
//!
//! A scan runs in two phases:
//! 1. every record is evaluated against every rule in parallel (rayon);
//!    this phase is pure and touches no shared state;
//! 2. alert transitions are applied sequentially in input order: open
//!    alerts are re-checked for auto-resolution, then each record's most
//!    severe match raises (or keeps) an alert.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use redzone_core::{EngineConfig, Record};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audit_log::{AuditLog, ExecutionPhase, LogLevel};
use crate::evaluator::{CompiledRule, RuleEvaluator, RuleHit};
use crate::lifecycle::{Alert, AlertError, AlertTracker, Transition};
use crate::schema::Rule;
use crate::validation::{validate_rule, SchemaError};

/// One customer's record as fed to a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub record: Record,
}

impl CustomerRecord {
    pub fn new(customer_id: impl Into<String>, record: Record) -> Self {
        Self {
            customer_id: customer_id.into(),
            record,
        }
    }
}

/// A record whose most severe matching rule has an (open) alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerMatch {
    pub customer_id: String,
    pub alert_id: Uuid,
    #[serde(flatten)]
    pub hit: RuleHit,
}

/// Outcome of [`RedZoneEngine::scan`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub evaluated: usize,
    pub matches: Vec<CustomerMatch>,
    /// Newly created alerts.
    pub raised: Vec<Uuid>,
    /// Alerts closed by auto-resolution during this scan.
    pub resolved: Vec<Uuid>,
    pub duration_ms: u64,
}

fn enabled_only(rules: Vec<CompiledRule>) -> Vec<CompiledRule> {
    let (enabled, disabled): (Vec<_>, Vec<_>) = rules.into_iter().partition(|r| r.enabled);
    for rule in &disabled {
        debug!(rule_id = %rule.id, "skipping disabled rule");
    }
    enabled
}

/// Phase 1 result for one record.
struct RecordOutcome {
    best: Option<RuleHit>,
    /// Indices of rules whose auto-resolution holds for this record.
    resolvable: Vec<usize>,
}

/// Holds compiled rules and the alert tracker; drives scans.
pub struct RedZoneEngine {
    rules: Vec<CompiledRule>,
    tracker: AlertTracker,
    audit: Arc<AuditLog>,
    pool: Option<rayon::ThreadPool>,
}

impl RedZoneEngine {
    /// Use already compiled rules. Disabled rules are dropped.
    pub fn new(rules: Vec<CompiledRule>) -> Self {
        Self {
            rules: enabled_only(rules),
            tracker: AlertTracker::new(),
            audit: Arc::new(AuditLog::new()),
            pool: None,
        }
    }

    /// Compile and load rules; the first invalid rule aborts.
    pub fn from_rules(rules: &[Rule]) -> Result<Self, SchemaError> {
        let mut engine = Self::new(Vec::new());
        engine.load_rules(rules)?;
        Ok(engine)
    }

    /// Validate, compile and swap in a new rule set, recording the
    /// validation phase of every rule in the audit log.
    ///
    /// The current rule set is kept when any rule is invalid. Returns the
    /// number of enabled rules.
    pub fn load_rules(&mut self, rules: &[Rule]) -> Result<usize, SchemaError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            for warning in validate_rule(rule, None).warnings {
                self.audit.log(
                    &rule.id,
                    LogLevel::Warning,
                    ExecutionPhase::Validation,
                    format!("{}: {}", warning.path, warning.message),
                );
            }
            match rule.compile() {
                Ok(rule) => {
                    self.audit.log(
                        &rule.id,
                        LogLevel::Info,
                        ExecutionPhase::Validation,
                        "rule compiled",
                    );
                    compiled.push(rule);
                }
                Err(e) => {
                    self.audit.log(
                        &rule.id,
                        LogLevel::Error,
                        ExecutionPhase::Validation,
                        e.to_string(),
                    );
                    return Err(e);
                }
            }
        }
        self.rules = enabled_only(compiled);
        Ok(self.rules.len())
    }

    /// Apply audit cap and thread count from configuration.
    pub fn configured(self, config: &EngineConfig) -> Self {
        self.with_audit_log(Arc::new(AuditLog::with_max_entries(config.audit_max_entries)))
            .with_threads(config.scan_threads)
    }

    pub fn with_audit_log(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    /// Run scans on a dedicated pool of `threads` workers (0 = global pool).
    pub fn with_threads(mut self, threads: usize) -> Self {
        if threads == 0 {
            self.pool = None;
            return self;
        }
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => self.pool = Some(pool),
            Err(e) => warn!(threads, error = %e, "failed to build scan pool, using global pool"),
        }
        self
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn tracker(&self) -> &AlertTracker {
        &self.tracker
    }

    pub fn audit_log(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    /// Most severe matching rule for one record. No alert side effects.
    pub fn evaluate(&self, record: &Record) -> Option<RuleHit> {
        RuleEvaluator::most_severe(&self.rules, record)
    }

    /// Evaluate a batch and apply alert transitions.
    pub fn scan(&mut self, batch: &[CustomerRecord]) -> ScanReport {
        let started = Instant::now();
        let outcomes = self.evaluate_batch(batch);

        let mut report = ScanReport {
            evaluated: batch.len(),
            ..Default::default()
        };
        let mut matched_per_rule = vec![0usize; self.rules.len()];

        for (item, outcome) in batch.iter().zip(outcomes) {
            let mut resolved_now: HashSet<&str> = HashSet::new();

            for index in outcome.resolvable {
                let rule = &self.rules[index];
                let Some(alert) = self.tracker.open_alert_for(&item.customer_id, &rule.id) else {
                    continue;
                };
                let alert_id = alert.id;
                if let Ok(Transition::Resolved) = self.tracker.resolve_automatic(alert_id) {
                    self.audit.log_with_details(
                        &rule.id,
                        LogLevel::Info,
                        ExecutionPhase::AutoResolve,
                        format!("alert for {} resolved automatically", item.customer_id),
                        Some(serde_json::json!({
                            "customer_id": item.customer_id,
                            "alert_id": alert_id,
                        })),
                    );
                    report.resolved.push(alert_id);
                    resolved_now.insert(rule.id.as_str());
                }
            }

            let Some(hit) = outcome.best else {
                continue;
            };
            if let Some(index) = self.rules.iter().position(|r| r.id == hit.rule_id) {
                matched_per_rule[index] += 1;
            }
            if resolved_now.contains(hit.rule_id.as_str()) {
                continue;
            }

            let (alert_id, created) = self.tracker.raise(&item.customer_id, &hit);
            if created {
                self.audit.log_with_details(
                    &hit.rule_id,
                    LogLevel::Info,
                    ExecutionPhase::AlertRaised,
                    format!("alert raised for {}: {}", item.customer_id, hit.reason),
                    Some(serde_json::json!({
                        "customer_id": item.customer_id,
                        "alert_id": alert_id,
                        "severity": hit.severity,
                    })),
                );
                report.raised.push(alert_id);
            }
            report.matches.push(CustomerMatch {
                customer_id: item.customer_id.clone(),
                alert_id,
                hit,
            });
        }

        for (rule, matched) in self.rules.iter().zip(&matched_per_rule) {
            self.audit.log(
                &rule.id,
                LogLevel::Debug,
                ExecutionPhase::Evaluation,
                format!("{} of {} records matched as most severe", matched, batch.len()),
            );
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        for rule in &self.rules {
            self.audit.log(
                &rule.id,
                LogLevel::Info,
                ExecutionPhase::Complete,
                format!("scan complete in {}ms", report.duration_ms),
            );
        }

        info!(
            evaluated = report.evaluated,
            matches = report.matches.len(),
            raised = report.raised.len(),
            resolved = report.resolved.len(),
            duration_ms = report.duration_ms,
            "red zone scan complete"
        );
        report
    }

    /// Take resolved alerts out of the tracker so a long-running engine
    /// does not grow without bound.
    pub fn drain_resolved(&mut self) -> Vec<Alert> {
        self.tracker.drain_resolved()
    }

    /// Resolve an alert by hand and record it in the audit log.
    pub fn resolve_manual(
        &mut self,
        alert_id: Uuid,
        by: &str,
        note: Option<String>,
    ) -> Result<Transition, AlertError> {
        let transition = self.tracker.resolve_manual(alert_id, by, note)?;
        if transition == Transition::Resolved {
            if let Some(alert) = self.tracker.get(alert_id) {
                self.audit.log(
                    &alert.rule_id,
                    LogLevel::Info,
                    ExecutionPhase::ManualResolve,
                    format!("alert for {} resolved by {}", alert.customer_id, by),
                );
            }
        }
        Ok(transition)
    }

    fn evaluate_batch(&self, batch: &[CustomerRecord]) -> Vec<RecordOutcome> {
        let rules = &self.rules;
        let run = || -> Vec<RecordOutcome> {
            batch
                .par_iter()
                .map(|item| RecordOutcome {
                    best: RuleEvaluator::most_severe(rules, &item.record),
                    resolvable: rules
                        .iter()
                        .enumerate()
                        .filter(|(_, rule)| rule.should_auto_resolve(&item.record))
                        .map(|(i, _)| i)
                        .collect(),
                })
                .collect()
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit_log::LogQueryParams;
    use crate::lifecycle::Resolution;
    use crate::schema::{Condition, RuleExpression, Severity};
    use serde_json::json;

    fn rules() -> Vec<Rule> {
        vec![
            Rule::new(
                "low-nps",
                "Low NPS",
                Severity::AttentionNeeded,
                RuleExpression::all_of(vec![Condition::new("nps", "less_than", "5")]),
            )
            .resolving_when(vec![]),
            Rule::new(
                "at-risk",
                "At risk",
                Severity::Critical,
                RuleExpression::all_of(vec![Condition::new("health_status", "equals", "at_risk")]),
            )
            .resolving_when(vec![Condition::new("health_status", "equals", "healthy")]),
        ]
    }

    fn customer(id: &str, value: serde_json::Value) -> CustomerRecord {
        CustomerRecord::new(id, Record::from_value(value).unwrap())
    }

    #[test]
    fn scan_raises_most_severe_alert_once() {
        let mut engine = RedZoneEngine::from_rules(&rules()).unwrap();
        let batch = vec![
            customer("c-1", json!({"nps": 2, "health_status": "at_risk"})),
            customer("c-2", json!({"nps": 2, "health_status": "healthy"})),
            customer("c-3", json!({"nps": 9, "health_status": "healthy"})),
        ];

        let report = engine.scan(&batch);
        assert_eq!(report.evaluated, 3);
        assert_eq!(report.matches.len(), 2);
        assert_eq!(report.raised.len(), 2);
        assert_eq!(report.matches[0].hit.rule_id, "at-risk");
        assert_eq!(report.matches[1].hit.rule_id, "low-nps");

        let again = engine.scan(&batch);
        assert!(again.raised.is_empty());
        assert_eq!(again.matches[0].alert_id, report.matches[0].alert_id);
        assert_eq!(engine.tracker().open_alerts().len(), 2);
    }

    #[test]
    fn scan_auto_resolves_open_alerts() {
        let mut engine = RedZoneEngine::from_rules(&rules()).unwrap();
        engine.scan(&[customer("c-1", json!({"nps": 2, "health_status": "at_risk"}))]);
        // low-nps alert was never raised: at-risk was more severe
        assert_eq!(engine.tracker().open_alerts().len(), 1);

        let report = engine.scan(&[customer("c-1", json!({"nps": 2, "health_status": "healthy"}))]);
        assert_eq!(report.resolved.len(), 1);
        assert_eq!(report.raised.len(), 1);
        assert_eq!(report.matches[0].hit.rule_id, "low-nps");

        let resolved = engine.tracker().get(report.resolved[0]).unwrap();
        assert_eq!(resolved.resolution, Some(Resolution::Automatic));

        let report = engine.scan(&[customer("c-1", json!({"nps": 8, "health_status": "healthy"}))]);
        assert_eq!(report.resolved.len(), 1);
        assert!(engine.tracker().open_alerts().is_empty());
    }

    #[test]
    fn manual_resolution_is_audited() {
        let audit = Arc::new(AuditLog::new());
        let mut engine = RedZoneEngine::from_rules(&rules())
            .unwrap()
            .with_audit_log(audit.clone())
            .with_threads(2);
        let report = engine.scan(&[customer("c-7", json!({"health_status": "at_risk"}))]);
        let alert_id = report.raised[0];

        assert_eq!(engine.resolve_manual(alert_id, "dana", None).unwrap(), Transition::Resolved);
        assert_eq!(
            engine.resolve_manual(alert_id, "dana", None).unwrap(),
            Transition::AlreadyResolved
        );

        let params = LogQueryParams {
            phase: Some(ExecutionPhase::ManualResolve),
            ..Default::default()
        };
        assert_eq!(audit.query("at-risk", &params).len(), 1);
        let raised = LogQueryParams {
            phase: Some(ExecutionPhase::AlertRaised),
            ..Default::default()
        };
        assert_eq!(audit.query("at-risk", &raised).len(), 1);
    }

    #[test]
    fn loading_rules_records_validation_phase() {
        let audit = Arc::new(AuditLog::new());
        let mut engine = RedZoneEngine::new(Vec::new()).with_audit_log(audit.clone());
        let mut set = rules();
        set.push(Rule::new(
            "plan-order",
            "Plan ordering",
            Severity::HighRisk,
            RuleExpression::all_of(vec![Condition::new("plan", "greater_than", "gold")]),
        ));
        assert_eq!(engine.load_rules(&set).unwrap(), 3);

        let validation = LogQueryParams {
            phase: Some(ExecutionPhase::Validation),
            ..Default::default()
        };
        assert_eq!(audit.query("at-risk", &validation).len(), 1);
        let warnings = LogQueryParams {
            level: Some(LogLevel::Warning),
            ..validation
        };
        let entries = audit.query("plan-order", &warnings);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].message.contains("never matches"));
    }

    #[test]
    fn invalid_rule_keeps_current_rule_set() {
        let audit = Arc::new(AuditLog::new());
        let mut engine = RedZoneEngine::from_rules(&rules())
            .unwrap()
            .with_audit_log(audit.clone());
        let broken = Rule::new(
            "broken",
            "Broken",
            Severity::Critical,
            RuleExpression::all_of(vec![Condition::new("nps", "equal", "1")]),
        );

        assert!(engine.load_rules(&[broken]).is_err());
        assert_eq!(engine.rules().len(), 2);
        let errors = LogQueryParams {
            level: Some(LogLevel::Error),
            phase: Some(ExecutionPhase::Validation),
            ..Default::default()
        };
        assert_eq!(audit.query("broken", &errors).len(), 1);
    }

    #[test]
    fn drained_alerts_leave_open_ones_in_place() {
        let mut engine = RedZoneEngine::from_rules(&rules()).unwrap();
        engine.scan(&[
            customer("c-1", json!({"health_status": "at_risk"})),
            customer("c-2", json!({"health_status": "at_risk"})),
        ]);
        engine.scan(&[customer("c-1", json!({"health_status": "healthy"}))]);

        let drained = engine.drain_resolved();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].customer_id, "c-1");
        assert_eq!(engine.tracker().len(), 1);
        assert!(engine.tracker().open_alert_for("c-2", "at-risk").is_some());
    }

    #[test]
    fn configured_applies_audit_cap_and_threads() {
        let config = EngineConfig {
            audit_max_entries: 2,
            scan_threads: 2,
        };
        let mut engine = RedZoneEngine::from_rules(&rules()).unwrap().configured(&config);
        for _ in 0..3 {
            engine.scan(&[customer("c-1", json!({"nps": 1}))]);
        }
        let all = LogQueryParams::default();
        assert_eq!(engine.audit_log().query("low-nps", &all).len(), 2);
        assert_eq!(engine.tracker().open_alerts().len(), 1);
    }

    #[test]
    fn disabled_rules_are_not_loaded() {
        let mut set = rules();
        set[1] = set[1].clone().disabled();
        let engine = RedZoneEngine::from_rules(&set).unwrap();
        assert_eq!(engine.rules().len(), 1);
        let record = Record::from_value(json!({"health_status": "at_risk"})).unwrap();
        assert!(engine.evaluate(&record).is_none());
    }

    #[test]
    fn parallel_scan_preserves_input_order() {
        let mut engine = RedZoneEngine::from_rules(&rules()).unwrap().with_threads(4);
        let batch: Vec<CustomerRecord> = (0..200)
            .map(|i| customer(&format!("c-{i}"), json!({ "nps": i % 10 })))
            .collect();
        let report = engine.scan(&batch);
        assert_eq!(report.matches.len(), 100);
        let ids: Vec<&str> = report.matches.iter().map(|m| m.customer_id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort_by_key(|id| id[2..].parse::<usize>().unwrap());
        assert_eq!(ids, sorted);
    }
}

//! Alert lifecycle: `open -> resolved`, manually or automatically.
//!
//! At most one open alert exists per (customer, rule). Raising while open
//! returns the existing alert; resolving twice is a no-op; raising after
//! resolution starts a new alert. Resolved alerts never re-open.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use redzone_core::Record;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::evaluator::{CompiledRule, RuleHit};
use crate::schema::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Open,
    Resolved,
}

/// How an alert was closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    Manual {
        by: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    Automatic,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Manual { by, .. } => write!(f, "manually by {by}"),
            Resolution::Automatic => f.write_str("automatically"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub customer_id: String,
    pub rule_id: String,
    pub rule_name: String,
    pub severity: Severity,
    pub status: AlertStatus,
    /// Why the rule matched when the alert was raised.
    pub reason: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

impl Alert {
    pub fn is_open(&self) -> bool {
        self.status == AlertStatus::Open
    }
}

/// Outcome of a resolve request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Resolved,
    AlreadyResolved,
}

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert not found: {0}")]
    NotFound(Uuid),
}

/// In-memory alert store enforcing the lifecycle rules.
///
/// Resolved alerts stay in the store (for history queries) until taken out
/// with [`AlertTracker::drain_resolved`]; long-lived hosts should drain
/// them periodically and persist them elsewhere.
#[derive(Debug, Default)]
pub struct AlertTracker {
    alerts: Vec<Alert>,
    by_id: HashMap<Uuid, usize>,
    open: HashMap<(String, String), Uuid>,
}

impl AlertTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise an alert for `customer_id` from a rule hit.
    ///
    /// Returns the alert id and whether a new alert was created (`false` when
    /// an open alert for the same customer and rule already exists).
    pub fn raise(&mut self, customer_id: &str, hit: &RuleHit) -> (Uuid, bool) {
        let key = (customer_id.to_string(), hit.rule_id.clone());
        if let Some(id) = self.open.get(&key) {
            debug!(customer_id, rule_id = %hit.rule_id, alert_id = %id, "alert already open");
            return (*id, false);
        }

        let alert = Alert {
            id: Uuid::new_v4(),
            customer_id: customer_id.to_string(),
            rule_id: hit.rule_id.clone(),
            rule_name: hit.rule_name.clone(),
            severity: hit.severity,
            status: AlertStatus::Open,
            reason: hit.reason.clone(),
            created_at: Utc::now(),
            resolved_at: None,
            resolution: None,
        };
        let id = alert.id;
        info!(customer_id, rule_id = %hit.rule_id, severity = %hit.severity, alert_id = %id, "alert raised");

        self.by_id.insert(id, self.alerts.len());
        self.alerts.push(alert);
        self.open.insert(key, id);
        (id, true)
    }

    /// Resolve an alert by hand.
    pub fn resolve_manual(
        &mut self,
        alert_id: Uuid,
        by: &str,
        note: Option<String>,
    ) -> Result<Transition, AlertError> {
        self.resolve(
            alert_id,
            Resolution::Manual {
                by: by.to_string(),
                note,
            },
        )
    }

    pub fn resolve_automatic(&mut self, alert_id: Uuid) -> Result<Transition, AlertError> {
        self.resolve(alert_id, Resolution::Automatic)
    }

    fn resolve(&mut self, alert_id: Uuid, resolution: Resolution) -> Result<Transition, AlertError> {
        let index = *self
            .by_id
            .get(&alert_id)
            .ok_or(AlertError::NotFound(alert_id))?;
        let alert = &mut self.alerts[index];

        if !alert.is_open() {
            debug!(alert_id = %alert_id, "alert already resolved");
            return Ok(Transition::AlreadyResolved);
        }

        info!(
            alert_id = %alert_id,
            customer_id = %alert.customer_id,
            rule_id = %alert.rule_id,
            "alert resolved {resolution}"
        );
        alert.status = AlertStatus::Resolved;
        alert.resolved_at = Some(Utc::now());
        alert.resolution = Some(resolution);
        self.open
            .remove(&(alert.customer_id.clone(), alert.rule_id.clone()));
        Ok(Transition::Resolved)
    }

    /// Re-check the open alert of `rule` for this customer against a fresh
    /// record; resolves it automatically when the rule says so.
    ///
    /// Returns the id of the alert that was resolved, if any.
    pub fn recheck(&mut self, customer_id: &str, rule: &CompiledRule, record: &Record) -> Option<Uuid> {
        let id = self.open_alert_for(customer_id, &rule.id)?.id;
        if !rule.should_auto_resolve(record) {
            return None;
        }
        match self.resolve_automatic(id) {
            Ok(Transition::Resolved) => Some(id),
            _ => None,
        }
    }

    pub fn get(&self, alert_id: Uuid) -> Option<&Alert> {
        self.by_id.get(&alert_id).map(|&i| &self.alerts[i])
    }

    pub fn open_alert_for(&self, customer_id: &str, rule_id: &str) -> Option<&Alert> {
        self.open
            .get(&(customer_id.to_string(), rule_id.to_string()))
            .and_then(|id| self.get(*id))
    }

    /// Open alerts in creation order.
    pub fn open_alerts(&self) -> Vec<&Alert> {
        self.alerts.iter().filter(|a| a.is_open()).collect()
    }

    /// Every alert (open or resolved) for a customer, in creation order.
    pub fn alerts_for_customer(&self, customer_id: &str) -> Vec<&Alert> {
        self.alerts
            .iter()
            .filter(|a| a.customer_id == customer_id)
            .collect()
    }

    /// Remove and return every resolved alert, oldest first. Open alerts
    /// and their ids are kept.
    pub fn drain_resolved(&mut self) -> Vec<Alert> {
        let (open, resolved): (Vec<Alert>, Vec<Alert>) =
            std::mem::take(&mut self.alerts).into_iter().partition(Alert::is_open);
        self.by_id = open.iter().enumerate().map(|(i, a)| (a.id, i)).collect();
        self.alerts = open;
        if !resolved.is_empty() {
            debug!(drained = resolved.len(), open = self.alerts.len(), "drained resolved alerts");
        }
        resolved
    }

    pub fn all(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Condition, Rule, RuleExpression};
    use serde_json::json;

    fn hit(rule_id: &str) -> RuleHit {
        RuleHit {
            rule_id: rule_id.to_string(),
            rule_name: "At risk".to_string(),
            severity: Severity::Critical,
            reason: "AND: (AND: health_status=at_risk equals at_risk)".to_string(),
        }
    }

    #[test]
    fn raising_twice_while_open_yields_one_alert() {
        let mut tracker = AlertTracker::new();
        let (first, created) = tracker.raise("c-1", &hit("at-risk"));
        assert!(created);
        let (second, created) = tracker.raise("c-1", &hit("at-risk"));
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(tracker.len(), 1);

        let (other, created) = tracker.raise("c-2", &hit("at-risk"));
        assert!(created);
        assert_ne!(other, first);
        assert_eq!(tracker.open_alerts().len(), 2);
    }

    #[test]
    fn manual_resolution_is_idempotent() {
        let mut tracker = AlertTracker::new();
        let (id, _) = tracker.raise("c-1", &hit("at-risk"));

        let first = tracker.resolve_manual(id, "dana", Some("called customer".into())).unwrap();
        assert_eq!(first, Transition::Resolved);
        let alert = tracker.get(id).unwrap();
        assert_eq!(alert.status, AlertStatus::Resolved);
        assert!(alert.resolved_at.is_some());
        assert_eq!(
            alert.resolution,
            Some(Resolution::Manual {
                by: "dana".into(),
                note: Some("called customer".into())
            })
        );

        let second = tracker.resolve_manual(id, "sam", None).unwrap();
        assert_eq!(second, Transition::AlreadyResolved);
        assert_eq!(tracker.resolve_automatic(id).unwrap(), Transition::AlreadyResolved);
        assert!(matches!(
            tracker.get(id).unwrap().resolution,
            Some(Resolution::Manual { ref by, .. }) if by == "dana"
        ));
    }

    #[test]
    fn raising_after_resolution_creates_new_alert() {
        let mut tracker = AlertTracker::new();
        let (first, _) = tracker.raise("c-1", &hit("at-risk"));
        tracker.resolve_automatic(first).unwrap();

        let (second, created) = tracker.raise("c-1", &hit("at-risk"));
        assert!(created);
        assert_ne!(first, second);
        assert_eq!(tracker.alerts_for_customer("c-1").len(), 2);
        assert_eq!(tracker.open_alerts().len(), 1);
        assert_eq!(tracker.get(first).unwrap().status, AlertStatus::Resolved);
    }

    #[test]
    fn unknown_alert_is_an_error() {
        let mut tracker = AlertTracker::new();
        let id = Uuid::new_v4();
        assert!(matches!(
            tracker.resolve_manual(id, "dana", None),
            Err(AlertError::NotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn recheck_resolves_when_resolution_conditions_hold() {
        let rule = Rule::new(
            "at-risk",
            "At risk",
            Severity::Critical,
            RuleExpression::all_of(vec![Condition::new("health_status", "equals", "at_risk")]),
        )
        .resolving_when(vec![Condition::new("health_status", "equals", "healthy")])
        .compile()
        .unwrap();

        let mut tracker = AlertTracker::new();
        let (id, _) = tracker.raise("c-1", &hit("at-risk"));

        let still_bad = Record::from_value(json!({"health_status": "at_risk"})).unwrap();
        assert_eq!(tracker.recheck("c-1", &rule, &still_bad), None);
        let unknown = Record::from_value(json!({"health_status": "unknown"})).unwrap();
        assert_eq!(tracker.recheck("c-1", &rule, &unknown), None);

        let healthy = Record::from_value(json!({"health_status": "healthy"})).unwrap();
        assert_eq!(tracker.recheck("c-1", &rule, &healthy), Some(id));
        assert_eq!(tracker.get(id).unwrap().resolution, Some(Resolution::Automatic));
        assert_eq!(tracker.recheck("c-1", &rule, &healthy), None);
        assert!(tracker.open_alert_for("c-1", "at-risk").is_none());
    }

    #[test]
    fn alert_serializes_with_tagged_resolution() {
        let mut tracker = AlertTracker::new();
        let (id, _) = tracker.raise("c-9", &hit("at-risk"));
        tracker.resolve_manual(id, "dana", None).unwrap();

        let json = serde_json::to_value(tracker.get(id).unwrap()).unwrap();
        assert_eq!(json["status"], "resolved");
        assert_eq!(json["severity"], "critical");
        assert_eq!(json["resolution"]["kind"], "manual");
        assert_eq!(json["resolution"]["by"], "dana");
    }

    #[test]
    fn drain_resolved_keeps_open_alerts_addressable() {
        let mut tracker = AlertTracker::new();
        let (first, _) = tracker.raise("c-1", &hit("at-risk"));
        let (second, _) = tracker.raise("c-2", &hit("at-risk"));
        let (third, _) = tracker.raise("c-3", &hit("at-risk"));
        tracker.resolve_automatic(first).unwrap();
        tracker.resolve_manual(third, "dana", None).unwrap();

        let drained = tracker.drain_resolved();
        let ids: Vec<Uuid> = drained.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![first, third]);

        assert_eq!(tracker.len(), 1);
        assert!(tracker.get(first).is_none());
        assert_eq!(tracker.get(second).unwrap().customer_id, "c-2");
        assert_eq!(tracker.open_alert_for("c-2", "at-risk").unwrap().id, second);
        assert_eq!(tracker.resolve_automatic(second).unwrap(), Transition::Resolved);
        assert!(matches!(tracker.resolve_automatic(first), Err(AlertError::NotFound(_))));

        assert_eq!(tracker.drain_resolved().len(), 1);
        assert!(tracker.is_empty());
        assert!(tracker.drain_resolved().is_empty());
    }
}

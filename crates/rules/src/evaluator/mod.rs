//! Condition evaluator for Red Zone rules.
//!
//! Rules are compiled once ([`Rule::compile`](crate::schema::Rule::compile))
//! into a typed tree: each condition's operator becomes a [`Predicate`]
//! carrying its parsed operands. Evaluation is a pure function of the
//! compiled rule and one [`Record`]; missing or ill-typed values resolve the
//! condition to "no match" instead of failing.

pub(crate) mod coerce;
mod compile;
mod composition;
mod predicate;

use redzone_core::Record;
use serde::{Deserialize, Serialize};

use crate::schema::Severity;

pub use compile::{AutoResolve, CompiledRule};
pub use composition::{CompiledExpression, CompiledGroup};
pub use predicate::{CompiledCondition, Predicate};

/// A rule that matched a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleHit {
    pub rule_id: String,
    pub rule_name: String,
    pub severity: Severity,
    pub reason: String,
}

impl RuleHit {
    fn from_rule(rule: &CompiledRule, record: &Record) -> Option<Self> {
        if !rule.enabled {
            return None;
        }
        rule.expression.explain(record).map(|reason| RuleHit {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            severity: rule.severity,
            reason,
        })
    }
}

// ── Rule evaluator ──────────────────────────────────────────────────

/// Evaluates compiled rules against records.
pub struct RuleEvaluator;

impl RuleEvaluator {
    /// Evaluate a single rule. Disabled rules never match.
    pub fn evaluate(rule: &CompiledRule, record: &Record) -> Option<RuleHit> {
        RuleHit::from_rule(rule, record)
    }

    /// All matching rules, in rule order.
    pub fn matching(rules: &[CompiledRule], record: &Record) -> Vec<RuleHit> {
        rules
            .iter()
            .filter_map(|rule| RuleHit::from_rule(rule, record))
            .collect()
    }

    /// The most severe matching rule. Ties go to the earlier rule.
    pub fn most_severe(rules: &[CompiledRule], record: &Record) -> Option<RuleHit> {
        let mut best: Option<RuleHit> = None;
        for hit in rules.iter().filter_map(|rule| RuleHit::from_rule(rule, record)) {
            match &best {
                Some(current) if current.severity >= hit.severity => {}
                _ => best = Some(hit),
            }
        }
        best
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Condition, Rule, RuleExpression};
    use serde_json::json;

    fn rule(id: &str, severity: Severity, condition: Condition) -> CompiledRule {
        Rule::new(id, id, severity, RuleExpression::all_of(vec![condition]))
            .compile()
            .unwrap()
    }

    fn rules() -> Vec<CompiledRule> {
        vec![
            rule("low-nps", Severity::AttentionNeeded, Condition::new("nps", "less_than", "7")),
            rule("very-low-nps", Severity::HighRisk, Condition::new("nps", "less_than", "4")),
            rule("no-csm", Severity::HighRisk, Condition::unary("csm", "is_empty")),
            rule("churning", Severity::Critical, Condition::new("status", "equals", "canceled")),
        ]
    }

    #[test]
    fn most_severe_match_wins() {
        let record = Record::from_value(json!({"nps": 2, "csm": "dana", "status": "active"})).unwrap();
        let hit = RuleEvaluator::most_severe(&rules(), &record).unwrap();
        assert_eq!(hit.rule_id, "very-low-nps");
        assert_eq!(hit.severity, Severity::HighRisk);
        assert_eq!(hit.reason, "AND: (AND: nps=2 less_than 4)");

        let canceled = Record::from_value(json!({"nps": 2, "status": "canceled"})).unwrap();
        assert_eq!(RuleEvaluator::most_severe(&rules(), &canceled).unwrap().rule_id, "churning");
    }

    #[test]
    fn ties_break_by_rule_order() {
        let record = Record::from_value(json!({"nps": 2})).unwrap();
        let hit = RuleEvaluator::most_severe(&rules(), &record).unwrap();
        assert_eq!(hit.rule_id, "very-low-nps");
        assert_eq!(RuleEvaluator::matching(&rules(), &record).len(), 3);
    }

    #[test]
    fn disabled_rules_are_skipped() {
        let mut set = rules();
        set[1].enabled = false;
        let record = Record::from_value(json!({"nps": 2, "csm": "dana"})).unwrap();
        let hit = RuleEvaluator::most_severe(&set, &record).unwrap();
        assert_eq!(hit.rule_id, "low-nps");
        assert!(RuleEvaluator::evaluate(&set[1], &record).is_none());
    }

    #[test]
    fn no_match_yields_none() {
        let record = Record::from_value(json!({"nps": 9, "csm": "dana"})).unwrap();
        assert!(RuleEvaluator::most_severe(&rules(), &record).is_none());
    }

    #[test]
    fn evaluation_is_deterministic() {
        let record = Record::from_value(json!({"nps": 5, "status": "canceled"})).unwrap();
        let first = RuleEvaluator::matching(&rules(), &record);
        let second = RuleEvaluator::matching(&rules(), &record);
        assert_eq!(first, second);
    }
}

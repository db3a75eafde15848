//! Compiled two-level AND/OR trees and match explanations.

use redzone_core::Record;

use crate::schema::{ConditionGroup, LogicOperator, RuleExpression};
use crate::validation::SchemaError;

use super::predicate::CompiledCondition;

/// A group of compiled conditions combined by the group's operator.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledGroup {
    pub logic_operator: LogicOperator,
    pub conditions: Vec<CompiledCondition>,
}

impl CompiledGroup {
    pub fn compile(group: &ConditionGroup) -> Result<Self, SchemaError> {
        Ok(Self {
            logic_operator: group.logic_operator,
            conditions: group
                .conditions
                .iter()
                .map(CompiledCondition::compile)
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.logic_operator
            .combine(self.conditions.iter().map(|c| c.evaluate(record)))
    }

    /// `(AND: a=1 equals 1, b=2 greater_than 1)`, listing the matching conditions.
    fn explain(&self, record: &Record) -> String {
        let parts: Vec<String> = self
            .conditions
            .iter()
            .filter(|c| c.evaluate(record))
            .map(|c| c.describe(record))
            .collect();
        format!("({}: {})", self.logic_operator.as_str(), parts.join(", "))
    }
}

/// A compiled rule expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    pub logic_operator: LogicOperator,
    pub groups: Vec<CompiledGroup>,
}

impl CompiledExpression {
    pub fn compile(expression: &RuleExpression) -> Result<Self, SchemaError> {
        Ok(Self {
            logic_operator: expression.logic_operator,
            groups: expression
                .groups
                .iter()
                .map(CompiledGroup::compile)
                .collect::<Result<_, _>>()?,
        })
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.logic_operator
            .combine(self.groups.iter().map(|g| g.matches(record)))
    }

    /// Human-readable reason for a match, e.g. `OR: (AND: nps=3 less_than 5)`.
    ///
    /// Returns `None` when the expression does not match.
    pub fn explain(&self, record: &Record) -> Option<String> {
        if !self.matches(record) {
            return None;
        }
        let parts: Vec<String> = self
            .groups
            .iter()
            .filter(|g| g.matches(record))
            .map(|g| g.explain(record))
            .collect();
        Some(format!("{}: {}", self.logic_operator.as_str(), parts.join(" ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Condition;
    use serde_json::json;

    fn group(op: LogicOperator, conditions: Vec<Condition>) -> ConditionGroup {
        ConditionGroup {
            logic_operator: op,
            conditions,
        }
    }

    fn expression(op: LogicOperator, groups: Vec<ConditionGroup>) -> CompiledExpression {
        CompiledExpression::compile(&RuleExpression {
            logic_operator: op,
            groups,
        })
        .unwrap()
    }

    fn record(value: serde_json::Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn and_of_ands_requires_every_condition() {
        let expr = expression(
            LogicOperator::And,
            vec![
                group(
                    LogicOperator::And,
                    vec![
                        Condition::new("nps", "less_than", "5"),
                        Condition::new("plan", "equals", "basic"),
                    ],
                ),
                group(LogicOperator::And, vec![Condition::new("seats", "greater_than", "10")]),
            ],
        );

        assert!(expr.matches(&record(json!({"nps": 2, "plan": "basic", "seats": 20}))));
        assert!(!expr.matches(&record(json!({"nps": 2, "plan": "pro", "seats": 20}))));
        assert!(!expr.matches(&record(json!({"nps": 2, "plan": "basic", "seats": 5}))));
    }

    #[test]
    fn or_at_top_level_needs_one_group() {
        let expr = expression(
            LogicOperator::Or,
            vec![
                group(LogicOperator::And, vec![Condition::new("nps", "less_than", "5")]),
                group(
                    LogicOperator::And,
                    vec![Condition::new("days_since_campaign", "greater_than", "60")],
                ),
            ],
        );

        assert!(expr.matches(&record(json!({"nps": 3}))));
        assert!(expr.matches(&record(json!({"nps": 3, "days_since_campaign": 10}))));
        assert!(expr.matches(&record(json!({"nps": 9, "days_since_campaign": 90}))));
        assert!(!expr.matches(&record(json!({"nps": 9, "days_since_campaign": 10}))));
    }

    #[test]
    fn or_inside_group() {
        let expr = expression(
            LogicOperator::And,
            vec![group(
                LogicOperator::Or,
                vec![
                    Condition::new("status", "equals", "past_due"),
                    Condition::new("status", "equals", "unpaid"),
                ],
            )],
        );
        assert!(expr.matches(&record(json!({"status": "unpaid"}))));
        assert!(!expr.matches(&record(json!({"status": "active"}))));
    }

    #[test]
    fn explanation_lists_matching_groups_only() {
        let expr = expression(
            LogicOperator::Or,
            vec![
                group(LogicOperator::And, vec![Condition::new("nps", "less_than", "5")]),
                group(
                    LogicOperator::And,
                    vec![Condition::new("days_since_campaign", "greater_than", "60")],
                ),
            ],
        );
        let rec = record(json!({"nps": 3, "days_since_campaign": 10}));
        assert_eq!(expr.explain(&rec).unwrap(), "OR: (AND: nps=3 less_than 5)");
        assert!(expr.explain(&record(json!({"nps": 8}))).is_none());
    }
}

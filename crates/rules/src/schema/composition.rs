//! Two-level boolean composition: groups of conditions combined by AND/OR.

use serde::{Deserialize, Serialize};

use super::Condition;

/// Logical operator combining conditions (within a group) or groups (at the top).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogicOperator {
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

impl LogicOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicOperator::And => "AND",
            LogicOperator::Or => "OR",
        }
    }

    /// AND = all true, OR = any true.
    pub fn combine<I: IntoIterator<Item = bool>>(&self, results: I) -> bool {
        let mut results = results.into_iter();
        match self {
            LogicOperator::And => results.all(|r| r),
            LogicOperator::Or => results.any(|r| r),
        }
    }
}

/// Conditions combined by the group's own operator. Must be non-empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConditionGroup {
    pub logic_operator: LogicOperator,
    pub conditions: Vec<Condition>,
}

/// Top-level expression: groups combined by `logic_operator`. Must be non-empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleExpression {
    pub logic_operator: LogicOperator,
    pub groups: Vec<ConditionGroup>,
}

impl RuleExpression {
    /// Single-group AND expression over the given conditions.
    pub fn all_of(conditions: Vec<Condition>) -> Self {
        Self {
            logic_operator: LogicOperator::And,
            groups: vec![ConditionGroup {
                logic_operator: LogicOperator::And,
                conditions,
            }],
        }
    }

    /// Iterate every condition in the tree.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.groups.iter().flat_map(|g| g.conditions.iter())
    }
}

//! Leaf conditions: field, operator and literal value.

use std::fmt;
use std::str::FromStr;

use redzone_core::{EntityType, FieldType};
use serde::{Deserialize, Serialize};

/// A single field/operator/value test.
///
/// `operator` is kept as raw text so that an unknown operator surfaces as a
/// validation error with a suggestion rather than a parse failure; it is
/// turned into a typed predicate when the rule is compiled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Condition {
    /// Record lookup path.
    pub field: String,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ConditionValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
}

impl Condition {
    pub fn new(field: &str, operator: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            operator: operator.to_string(),
            value: Some(ConditionValue::Single(Literal::Text(value.to_string()))),
            entity_type: None,
            field_type: None,
        }
    }

    /// A condition without a value (`is_empty`, `is_not_empty`).
    pub fn unary(field: &str, operator: &str) -> Self {
        Self {
            field: field.to_string(),
            operator: operator.to_string(),
            value: None,
            entity_type: None,
            field_type: None,
        }
    }

    pub fn typed(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }
}

// ── Operators ───────────────────────────────────────────────────────

/// Comparison operators available to conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
    InRange,
}

/// Wire names of every operator, in declaration order.
pub const OPERATOR_NAMES: &[&str] = &[
    "equals",
    "not_equals",
    "greater_than",
    "less_than",
    "contains",
    "starts_with",
    "ends_with",
    "is_empty",
    "is_not_empty",
    "in_range",
];

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::Contains => "contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::IsEmpty => "is_empty",
            Operator::IsNotEmpty => "is_not_empty",
            Operator::InRange => "in_range",
        }
    }

    /// Whether the operator reads the condition's `value`.
    pub fn takes_value(&self) -> bool {
        !matches!(self, Operator::IsEmpty | Operator::IsNotEmpty)
    }

    /// Whether the operator needs an ordered (number or date) field.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Operator::GreaterThan | Operator::LessThan | Operator::InRange
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "equals" => Ok(Operator::Equals),
            "not_equals" => Ok(Operator::NotEquals),
            "greater_than" => Ok(Operator::GreaterThan),
            "less_than" => Ok(Operator::LessThan),
            "contains" => Ok(Operator::Contains),
            "starts_with" => Ok(Operator::StartsWith),
            "ends_with" => Ok(Operator::EndsWith),
            "is_empty" => Ok(Operator::IsEmpty),
            "is_not_empty" => Ok(Operator::IsNotEmpty),
            "in_range" => Ok(Operator::InRange),
            other => Err(format!("unknown operator: '{}'", other)),
        }
    }
}

// ── Values ──────────────────────────────────────────────────────────

/// A condition value: normally a string, but YAML/JSON numbers and booleans
/// are accepted, and `in_range` may use a two-element list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConditionValue {
    Pair(Vec<Literal>),
    Single(Literal),
}

/// A scalar literal as written in the rule document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Literal {
    /// String form used for coercion: `5.0` becomes `"5"`.
    pub fn to_text(&self) -> String {
        match self {
            Literal::Bool(b) => b.to_string(),
            Literal::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Literal::Number(n) => n.to_string(),
            Literal::Text(s) => s.clone(),
        }
    }
}

impl ConditionValue {
    /// The single value, or `None` for a list.
    pub fn text(&self) -> Option<String> {
        match self {
            ConditionValue::Single(literal) => Some(literal.to_text()),
            ConditionValue::Pair(_) => None,
        }
    }

    /// Range bounds from `"low,high"` or a two-element list.
    pub fn bounds(&self) -> Option<(String, String)> {
        match self {
            ConditionValue::Pair(items) if items.len() == 2 => {
                Some((items[0].to_text(), items[1].to_text()))
            }
            ConditionValue::Pair(_) => None,
            ConditionValue::Single(literal) => {
                let text = literal.to_text();
                let mut parts = text.split(',');
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(low), Some(high), None) => {
                        Some((low.trim().to_string(), high.trim().to_string()))
                    }
                    _ => None,
                }
            }
        }
    }

    /// True for an empty string (or empty list).
    pub fn is_blank(&self) -> bool {
        match self {
            ConditionValue::Single(literal) => literal.to_text().is_empty(),
            ConditionValue::Pair(items) => items.is_empty(),
        }
    }
}

impl fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionValue::Single(literal) => f.write_str(&literal.to_text()),
            ConditionValue::Pair(items) => {
                let parts: Vec<String> = items.iter().map(Literal::to_text).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

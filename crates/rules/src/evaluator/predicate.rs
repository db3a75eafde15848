//! Compiled conditions: a typed predicate per operator.

use std::cmp::Ordering;
use std::fmt;

use redzone_core::{FieldType, Record};
use serde_json::Value;
use tracing::trace;

use crate::schema::{Condition, Operator};
use crate::validation::SchemaError;

use super::coerce::{
    coerce_literal, coerce_value, compare, display_text, infer_type, is_empty_value,
    scalars_equal, Scalar,
};

/// Operator with its parsed operands.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals(String),
    NotEquals(String),
    GreaterThan(String),
    LessThan(String),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    IsEmpty,
    IsNotEmpty,
    InRange { low: String, high: String },
}

impl Predicate {
    pub fn operator(&self) -> Operator {
        match self {
            Predicate::Equals(_) => Operator::Equals,
            Predicate::NotEquals(_) => Operator::NotEquals,
            Predicate::GreaterThan(_) => Operator::GreaterThan,
            Predicate::LessThan(_) => Operator::LessThan,
            Predicate::Contains(_) => Operator::Contains,
            Predicate::StartsWith(_) => Operator::StartsWith,
            Predicate::EndsWith(_) => Operator::EndsWith,
            Predicate::IsEmpty => Operator::IsEmpty,
            Predicate::IsNotEmpty => Operator::IsNotEmpty,
            Predicate::InRange { .. } => Operator::InRange,
        }
    }

    /// Build the predicate for a raw condition.
    pub fn from_condition(condition: &Condition) -> Result<Self, SchemaError> {
        let operator: Operator = condition
            .operator
            .parse()
            .map_err(|_| SchemaError::UnknownOperator(condition.operator.clone()))?;

        let bad_value = |reason: &str| SchemaError::BadValue {
            field: condition.field.clone(),
            reason: reason.to_string(),
        };
        let single = || {
            condition
                .value
                .as_ref()
                .and_then(|v| v.text())
                .ok_or_else(|| bad_value("expected a single value"))
        };

        Ok(match operator {
            Operator::Equals => Predicate::Equals(single()?),
            Operator::NotEquals => Predicate::NotEquals(single()?),
            Operator::GreaterThan => Predicate::GreaterThan(single()?),
            Operator::LessThan => Predicate::LessThan(single()?),
            Operator::Contains => Predicate::Contains(single()?),
            Operator::StartsWith => Predicate::StartsWith(single()?),
            Operator::EndsWith => Predicate::EndsWith(single()?),
            Operator::IsEmpty => Predicate::IsEmpty,
            Operator::IsNotEmpty => Predicate::IsNotEmpty,
            Operator::InRange => {
                let (low, high) = condition
                    .value
                    .as_ref()
                    .and_then(|v| v.bounds())
                    .ok_or_else(|| bad_value("in_range expects exactly two bounds"))?;
                Predicate::InRange { low, high }
            }
        })
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Equals(v)
            | Predicate::NotEquals(v)
            | Predicate::GreaterThan(v)
            | Predicate::LessThan(v)
            | Predicate::Contains(v)
            | Predicate::StartsWith(v)
            | Predicate::EndsWith(v) => write!(f, "{} {}", self.operator(), v),
            Predicate::IsEmpty | Predicate::IsNotEmpty => write!(f, "{}", self.operator()),
            Predicate::InRange { low, high } => write!(f, "in_range {},{}", low, high),
        }
    }
}

/// A condition ready for evaluation against records.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCondition {
    pub field: String,
    /// Declared type; inferred from each record value when absent.
    pub field_type: Option<FieldType>,
    pub predicate: Predicate,
}

impl CompiledCondition {
    pub fn compile(condition: &Condition) -> Result<Self, SchemaError> {
        Ok(Self {
            field: condition.field.clone(),
            field_type: condition.field_type,
            predicate: Predicate::from_condition(condition)?,
        })
    }

    /// Evaluate against one record. Data gaps resolve to `false`.
    pub fn evaluate(&self, record: &Record) -> bool {
        let value = record.get(&self.field);

        let value = match (&self.predicate, value) {
            (Predicate::IsEmpty, v) => return is_empty_value(v),
            (Predicate::IsNotEmpty, v) => return !is_empty_value(v),
            (_, None) | (_, Some(Value::Null)) => {
                trace!(field = %self.field, "field missing, condition does not match");
                return false;
            }
            (_, Some(v)) => v,
        };

        let matched = match &self.predicate {
            Predicate::Equals(expected) => self.equals(value, expected),
            Predicate::NotEquals(expected) => self.equals(value, expected).map(|eq| !eq),
            Predicate::GreaterThan(bound) => self
                .ordering(value, bound)
                .map(|ord| ord == Ordering::Greater),
            Predicate::LessThan(bound) => {
                self.ordering(value, bound).map(|ord| ord == Ordering::Less)
            }
            Predicate::Contains(needle) => display_text(value).map(|s| s.contains(needle.as_str())),
            Predicate::StartsWith(prefix) => {
                display_text(value).map(|s| s.starts_with(prefix.as_str()))
            }
            Predicate::EndsWith(suffix) => {
                display_text(value).map(|s| s.ends_with(suffix.as_str()))
            }
            Predicate::InRange { low, high } => self.in_range(value, low, high),
            Predicate::IsEmpty | Predicate::IsNotEmpty => None,
        };

        matched.unwrap_or_else(|| {
            trace!(
                field = %self.field,
                operator = %self.predicate.operator(),
                "value not comparable, condition does not match"
            );
            false
        })
    }

    fn effective_type(&self, value: &Value, ordered: bool) -> Option<FieldType> {
        self.field_type.or_else(|| infer_type(value, ordered))
    }

    fn operands(&self, value: &Value, literal: &str, ordered: bool) -> Option<(Scalar, Scalar)> {
        let field_type = self.effective_type(value, ordered)?;
        if ordered && !field_type.is_ordered() {
            return None;
        }
        Some((
            coerce_value(value, field_type)?,
            coerce_literal(literal, field_type)?,
        ))
    }

    fn equals(&self, value: &Value, expected: &str) -> Option<bool> {
        let (actual, expected) = self.operands(value, expected, false)?;
        Some(scalars_equal(&actual, &expected))
    }

    fn ordering(&self, value: &Value, bound: &str) -> Option<Ordering> {
        let (actual, bound) = self.operands(value, bound, true)?;
        compare(&actual, &bound)
    }

    fn in_range(&self, value: &Value, low: &str, high: &str) -> Option<bool> {
        let (actual, low) = self.operands(value, low, true)?;
        let (_, high) = self.operands(value, high, true)?;
        let above_low = compare(&actual, &low)? != Ordering::Less;
        let below_high = compare(&actual, &high)? != Ordering::Greater;
        Some(above_low && below_high)
    }

    /// `field=<value> <operator> <operand>` for match explanations.
    pub fn describe(&self, record: &Record) -> String {
        let shown = match record.get(&self.field) {
            None | Some(Value::Null) => "<missing>".to_string(),
            Some(v) => display_text(v).unwrap_or_else(|| v.to_string()),
        };
        format!("{}={} {}", self.field, shown, self.predicate)
    }
}

//! Condition tree checks: structure, operators and literal values.

use redzone_core::FieldType;

use crate::evaluator::coerce::{coerce_literal, infer_literal_type};
use crate::schema::{Condition, ConditionValue, Operator, RuleExpression, OPERATOR_NAMES};

use super::fuzzy::did_you_mean;
use super::ValidationResult;

pub(super) fn validate_expression(expr: &RuleExpression, path: &str, result: &mut ValidationResult) {
    if expr.groups.is_empty() {
        result.error(format!("{path}.groups"), "at least one condition group is required");
        return;
    }

    for (g, group) in expr.groups.iter().enumerate() {
        let group_path = format!("{path}.groups[{g}].conditions");
        if group.conditions.is_empty() {
            result.error(&group_path, "condition group must contain at least one condition");
            continue;
        }
        for (c, condition) in group.conditions.iter().enumerate() {
            validate_condition(condition, &format!("{group_path}[{c}]"), result);
        }
    }
}

pub(super) fn validate_condition(condition: &Condition, path: &str, result: &mut ValidationResult) {
    if condition.field.trim().is_empty() {
        result.error(format!("{path}.field"), "field must not be empty");
    }

    let operator: Operator = match condition.operator.parse() {
        Ok(op) => op,
        Err(_) => {
            result.error_with_suggestion(
                format!("{path}.operator"),
                format!(
                    "Unknown operator '{}'. Valid: {}",
                    condition.operator,
                    OPERATOR_NAMES.join(", ")
                ),
                did_you_mean(&condition.operator, OPERATOR_NAMES.iter().copied()),
            );
            return;
        }
    };

    let value_path = format!("{path}.value");

    if !operator.takes_value() {
        if condition.value.is_some() {
            result.warn(value_path, format!("value is ignored by '{operator}'"));
        }
        return;
    }

    let value = match &condition.value {
        Some(value) => value,
        None => {
            result.error(value_path, format!("'{operator}' requires a value"));
            return;
        }
    };

    if operator.is_ordering() {
        if let Some(declared) = condition.field_type.filter(|t| !t.is_ordered()) {
            result.error(
                format!("{path}.operator"),
                format!("'{operator}' needs a number or date field, but fieldType is '{declared}'"),
            );
            return;
        }
    }

    match operator {
        Operator::InRange => validate_range(value, condition.field_type, &value_path, result),
        Operator::Contains | Operator::StartsWith | Operator::EndsWith => {
            if value.text().is_none() {
                result.error(value_path, format!("'{operator}' takes a single value, not a list"));
            } else if value.is_blank() {
                result.warn(value_path, format!("empty value makes '{operator}' match every present value"));
            }
        }
        _ => {
            let Some(text) = value.text() else {
                result.error(value_path, format!("'{operator}' takes a single value, not a list"));
                return;
            };
            if let Some(declared) = condition.field_type {
                if coerce_literal(&text, declared).is_none() {
                    result.error(
                        value_path,
                        format!("'{text}' is not a valid {declared} value"),
                    );
                }
            } else if operator.is_ordering() && infer_literal_type(&text).is_none() {
                result.warn(
                    value_path,
                    format!("'{text}' is neither a number nor a date, so '{operator}' never matches"),
                );
            }
        }
    }
}

/// Two bounds, both of the same ordered type, low <= high.
fn validate_range(
    value: &ConditionValue,
    declared: Option<FieldType>,
    path: &str,
    result: &mut ValidationResult,
) {
    let Some((low, high)) = value.bounds() else {
        result.error(path, "in_range expects exactly two bounds: \"low,high\" or [low, high]");
        return;
    };

    let field_type = match declared {
        Some(declared) => declared,
        None => match (infer_literal_type(&low), infer_literal_type(&high)) {
            (Some(a), Some(b)) if a == b => a,
            (Some(_), Some(_)) => {
                result.error(path, format!("in_range bounds '{low}' and '{high}' have different types"));
                return;
            }
            _ => {
                result.error(path, format!("in_range bounds '{low}' and '{high}' must be numbers or dates"));
                return;
            }
        },
    };

    let (Some(lo), Some(hi)) = (coerce_literal(&low, field_type), coerce_literal(&high, field_type)) else {
        result.error(path, format!("in_range bounds '{low}' and '{high}' are not valid {field_type} values"));
        return;
    };

    if crate::evaluator::coerce::compare(&lo, &hi) == Some(std::cmp::Ordering::Greater) {
        result.error(path, format!("in_range lower bound '{low}' is greater than upper bound '{high}'"));
    }
}

//! Coercion of record values and rule literals into comparable scalars.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use redzone_core::FieldType;
use serde_json::Value;

/// A typed value ready for comparison.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Scalar {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
    Bool(bool),
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub(crate) fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD` (UTC).
pub(crate) fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Coerce a record value to `field_type`. Arrays and objects never coerce.
pub(crate) fn coerce_value(value: &Value, field_type: FieldType) -> Option<Scalar> {
    match (field_type, value) {
        (FieldType::String, _) => display_text(value).map(Scalar::Text),
        (FieldType::Number, Value::Number(n)) => n.as_f64().map(Scalar::Number),
        (FieldType::Number, Value::String(s)) => parse_number(s).map(Scalar::Number),
        (FieldType::Date, Value::String(s)) => parse_date(s).map(Scalar::Date),
        (FieldType::Date, Value::Number(n)) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .map(Scalar::Date),
        (FieldType::Boolean, Value::Bool(b)) => Some(Scalar::Bool(*b)),
        (FieldType::Boolean, Value::String(s)) => parse_bool(s).map(Scalar::Bool),
        (FieldType::Boolean, Value::Number(n)) => match n.as_f64() {
            Some(x) if x == 0.0 => Some(Scalar::Bool(false)),
            Some(x) if x == 1.0 => Some(Scalar::Bool(true)),
            _ => None,
        },
        _ => None,
    }
}

/// Coerce a rule literal (always text on the wire) to `field_type`.
pub(crate) fn coerce_literal(text: &str, field_type: FieldType) -> Option<Scalar> {
    match field_type {
        FieldType::String => Some(Scalar::Text(text.to_string())),
        FieldType::Number => parse_number(text).map(Scalar::Number),
        FieldType::Date => parse_date(text).map(Scalar::Date),
        FieldType::Boolean => parse_bool(text).map(Scalar::Bool),
    }
}

/// Infer a field type from the record value when none is declared.
///
/// With `ordered`, numeric strings count as numbers and date-like strings as
/// dates, so `"42" greater_than 10` compares numerically.
pub(crate) fn infer_type(value: &Value, ordered: bool) -> Option<FieldType> {
    match value {
        Value::Number(_) => Some(FieldType::Number),
        Value::Bool(_) => Some(FieldType::Boolean),
        Value::String(s) if ordered => {
            if parse_number(s).is_some() {
                Some(FieldType::Number)
            } else if parse_date(s).is_some() {
                Some(FieldType::Date)
            } else {
                Some(FieldType::String)
            }
        }
        Value::String(_) => Some(FieldType::String),
        _ => None,
    }
}

/// Type of a bare literal for ranges without a declared type: number, then date.
pub(crate) fn infer_literal_type(text: &str) -> Option<FieldType> {
    if parse_number(text).is_some() {
        Some(FieldType::Number)
    } else if parse_date(text).is_some() {
        Some(FieldType::Date)
    } else {
        None
    }
}

/// String representation used by substring operators.
pub(crate) fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Missing, null, or the empty string.
pub(crate) fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Equality after coercion: numbers within `f64::EPSILON`, dates by instant.
pub(crate) fn scalars_equal(a: &Scalar, b: &Scalar) -> bool {
    match (a, b) {
        (Scalar::Number(x), Scalar::Number(y)) => (x - y).abs() <= f64::EPSILON,
        (Scalar::Date(x), Scalar::Date(y)) => x == y,
        (Scalar::Text(x), Scalar::Text(y)) => x == y,
        (Scalar::Bool(x), Scalar::Bool(y)) => x == y,
        _ => false,
    }
}

/// Ordering between two scalars of an ordered type. `None` otherwise.
///
/// Agrees with [`scalars_equal`]: values it treats as equal compare `Equal`.
pub(crate) fn compare(a: &Scalar, b: &Scalar) -> Option<std::cmp::Ordering> {
    if scalars_equal(a, b) {
        return match (a, b) {
            (Scalar::Number(_), Scalar::Number(_)) | (Scalar::Date(_), Scalar::Date(_)) => {
                Some(std::cmp::Ordering::Equal)
            }
            _ => None,
        };
    }
    match (a, b) {
        (Scalar::Number(x), Scalar::Number(y)) => x.partial_cmp(y),
        (Scalar::Date(x), Scalar::Date(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_from_json_and_strings() {
        assert_eq!(coerce_value(&json!(3), FieldType::Number), Some(Scalar::Number(3.0)));
        assert_eq!(coerce_value(&json!(" 4.5 "), FieldType::Number), Some(Scalar::Number(4.5)));
        assert_eq!(coerce_value(&json!("n/a"), FieldType::Number), None);
        assert_eq!(coerce_value(&json!([1]), FieldType::Number), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn dates_in_supported_formats() {
        let day = parse_date("2024-03-01").unwrap();
        assert_eq!(parse_date("2024-03-01 00:00:00"), Some(day));
        assert_eq!(parse_date("2024-03-01T00:00:00"), Some(day));
        assert_eq!(parse_date("2024-03-01T02:00:00+02:00"), Some(day));
        assert_eq!(parse_date("01/03/2024"), None);

        let from_epoch = coerce_value(&json!(day.timestamp()), FieldType::Date);
        assert_eq!(from_epoch, Some(Scalar::Date(day)));
    }

    #[test]
    fn booleans_from_words_and_digits() {
        assert_eq!(coerce_value(&json!("Yes"), FieldType::Boolean), Some(Scalar::Bool(true)));
        assert_eq!(coerce_value(&json!(0), FieldType::Boolean), Some(Scalar::Bool(false)));
        assert_eq!(coerce_value(&json!(2), FieldType::Boolean), None);
        assert_eq!(coerce_literal("FALSE", FieldType::Boolean), Some(Scalar::Bool(false)));
    }

    #[test]
    fn strings_use_display_form() {
        assert_eq!(coerce_value(&json!(12), FieldType::String), Some(Scalar::Text("12".into())));
        assert_eq!(coerce_value(&json!(true), FieldType::String), Some(Scalar::Text("true".into())));
        assert_eq!(coerce_value(&json!({"a": 1}), FieldType::String), None);
    }

    #[test]
    fn inference_depends_on_operator_kind() {
        assert_eq!(infer_type(&json!("42"), false), Some(FieldType::String));
        assert_eq!(infer_type(&json!("42"), true), Some(FieldType::Number));
        assert_eq!(infer_type(&json!("2024-01-01"), true), Some(FieldType::Date));
        assert_eq!(infer_type(&json!("abc"), true), Some(FieldType::String));
        assert_eq!(infer_type(&json!(null), true), None);
    }

    #[test]
    fn emptiness() {
        assert!(is_empty_value(None));
        assert!(is_empty_value(Some(&json!(null))));
        assert!(is_empty_value(Some(&json!(""))));
        assert!(!is_empty_value(Some(&json!(" "))));
        assert!(!is_empty_value(Some(&json!(0))));
    }

    #[test]
    fn epsilon_equality() {
        assert!(scalars_equal(&Scalar::Number(0.1 + 0.2), &Scalar::Number(0.3)));
        assert!(!scalars_equal(&Scalar::Number(1.0), &Scalar::Text("1".into())));
    }

    #[test]
    fn ordering_agrees_with_equality() {
        use std::cmp::Ordering;

        let sum = Scalar::Number(0.1 + 0.2);
        assert_eq!(compare(&sum, &Scalar::Number(0.3)), Some(Ordering::Equal));
        assert_eq!(compare(&Scalar::Number(0.3), &sum), Some(Ordering::Equal));
        assert_eq!(compare(&Scalar::Number(2.0), &Scalar::Number(1.0)), Some(Ordering::Greater));
        assert_eq!(compare(&Scalar::Text("a".into()), &Scalar::Text("a".into())), None);
    }
}

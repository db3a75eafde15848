//! Mapping of storage types and field names to semantic field types.
//!
//! Precedence for a column: explicit field type, then declared storage type,
//! then the name heuristic. The name heuristic is a best-effort fallback for
//! externally mapped fields that carry no typing at all.

use redzone_core::FieldType;

use crate::source::ColumnMeta;

const NUMBER_TYPES: &[&str] = &[
    "int", "int2", "int4", "int8", "integer", "bigint", "smallint", "tinyint", "decimal",
    "numeric", "float", "float4", "float8", "double", "real", "money", "serial", "smallserial",
    "bigserial", "number",
];

const DATE_TYPES: &[&str] = &[
    "date", "time", "timetz", "timestamp", "timestamptz", "datetime", "interval",
];

const BOOLEAN_TYPES: &[&str] = &["bool", "boolean"];

const NUMBER_NAME_HINTS: &[&str] = &["amount", "count", "total", "price", "quantity", "score"];

/// Map a declared storage type (`numeric(10,2)`, `timestamp with time zone`,
/// `character varying(255)`, ...) to a semantic field type.
pub fn map_storage_type(declared: &str) -> FieldType {
    let lowered = declared.trim().to_lowercase();
    let base = lowered.split('(').next().unwrap_or("").trim();
    let head = base.split_whitespace().next().unwrap_or("");

    if BOOLEAN_TYPES.contains(&head) {
        FieldType::Boolean
    } else if DATE_TYPES.contains(&head) || head.contains("date") || head.starts_with("timestamp") {
        FieldType::Date
    } else if NUMBER_TYPES.contains(&head) {
        FieldType::Number
    } else {
        FieldType::String
    }
}

/// Guess a field type from its name alone.
///
/// Checked in order: number hints anywhere in the name, then `_at` suffix or
/// `date`, then `is_`/`has_` prefix. Anything else is a string.
pub fn infer_from_name(name: &str) -> FieldType {
    let name = name.to_lowercase();

    if NUMBER_NAME_HINTS.iter().any(|hint| name.contains(hint)) {
        FieldType::Number
    } else if name.ends_with("_at") || name.contains("date") {
        FieldType::Date
    } else if name.starts_with("is_") || name.starts_with("has_") {
        FieldType::Boolean
    } else {
        FieldType::String
    }
}

/// Resolve the semantic type of a column using the precedence rules.
pub fn resolve_field_type(column: &ColumnMeta) -> FieldType {
    if let Some(explicit) = column.field_type {
        return explicit;
    }
    match column.declared_type.as_deref() {
        Some(declared) if !declared.trim().is_empty() => map_storage_type(declared),
        _ => {
            let inferred = infer_from_name(&column.name);
            tracing::debug!(column = %column.name, field_type = %inferred, "inferred field type from name");
            inferred
        }
    }
}

/// Turn a column name into a display label: `days_since_campaign` → `Days Since Campaign`.
pub fn humanize_label(name: &str) -> String {
    name.split(['_', '.', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

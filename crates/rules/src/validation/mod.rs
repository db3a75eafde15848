//! Rule validation with structured errors and suggestions.
//!
//! Validates Red Zone rules (identity, condition tree, operators and literal
//! values, auto-resolution) and field catalog documents. Returns a
//! [`ValidationResult`] with errors (block save and compile) and warnings
//! (advisory). When a resolved field catalog is supplied, condition fields
//! are also checked against it.

mod catalog_checks;
mod expression_checks;
mod schema_checks;

pub mod fuzzy;

use redzone_catalog::AvailableFields;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::*;

// ── Result types ────────────────────────────────────────────────────

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

/// A blocking validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// JSON-path-like location, e.g. `"conditions.groups[0].conditions[1].operator"`.
    pub path: String,
    pub message: String,
    /// Optional "Did you mean …?" suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        });
    }

    pub(crate) fn error_with_suggestion(
        &mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<String>,
    ) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
            suggestion,
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            path: path.into(),
            message: message.into(),
        });
    }

    /// Errors located at exactly `path`.
    pub fn errors_at(&self, path: &str) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.path == path).collect()
    }
}

// ── Errors ──────────────────────────────────────────────────────────

/// A malformed rule definition, rejected before evaluation.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    #[error("rule '{rule_id}' is invalid: {}", summarize(.errors))]
    Invalid {
        rule_id: String,
        errors: Vec<ValidationError>,
    },

    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("invalid value for '{field}': {reason}")]
    BadValue { field: String, reason: String },
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| {
            if e.path.is_empty() {
                e.message.clone()
            } else {
                format!("{}: {}", e.path, e.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

// ── Public API ──────────────────────────────────────────────────────

/// Validate a [`Rule`], optionally against a resolved field catalog.
pub fn validate_rule(rule: &Rule, catalog: Option<&AvailableFields>) -> ValidationResult {
    let mut result = ValidationResult::new();
    check_rule(rule, catalog, RulePaths::BARE, &mut result);
    result
}

/// Validate any [`RuleDocument`] variant, dispatching to the appropriate validator.
pub fn validate_document(doc: &RuleDocument, catalog: Option<&AvailableFields>) -> ValidationResult {
    let mut result = ValidationResult::new();
    match doc {
        RuleDocument::RedZone(doc) => {
            schema_checks::validate_header(&doc.api_version, &doc.kind, RuleKind::RedZoneRule, &mut result);
            check_rule(&doc.to_rule(), catalog, RulePaths::DOCUMENT, &mut result);
        }
        RuleDocument::FieldCatalog(doc) => {
            schema_checks::validate_header(&doc.api_version, &doc.kind, RuleKind::FieldCatalog, &mut result);
            schema_checks::validate_identity(&doc.metadata.id, &doc.metadata.name, "metadata.", &mut result);
            catalog_checks::validate_catalog_spec(&doc.spec, &mut result);
        }
    }
    result
}

/// Parse a raw YAML (or JSON) document and validate it. Parse errors are
/// reported as errors at the document root.
pub fn validate_yaml(yaml: &str, catalog: Option<&AvailableFields>) -> ValidationResult {
    let parsed = serde_yaml::from_str::<RuleEnvelope>(yaml)
        .map_err(|e| format!("YAML parse error: {e}"))
        .and_then(|envelope| envelope.parse_full());
    match parsed {
        Ok(doc) => validate_document(&doc, catalog),
        Err(message) => {
            let mut result = ValidationResult::new();
            result.error("", message);
            result
        }
    }
}

/// Where a rule's parts live: bare `Rule` or inside a document's `metadata`/`spec`.
#[derive(Clone, Copy)]
pub(crate) struct RulePaths {
    pub meta: &'static str,
    pub spec: &'static str,
}

impl RulePaths {
    const BARE: RulePaths = RulePaths { meta: "", spec: "" };
    const DOCUMENT: RulePaths = RulePaths {
        meta: "metadata.",
        spec: "spec.",
    };
}

fn check_rule(
    rule: &Rule,
    catalog: Option<&AvailableFields>,
    paths: RulePaths,
    result: &mut ValidationResult,
) {
    schema_checks::validate_identity(&rule.id, &rule.name, paths.meta, result);
    expression_checks::validate_expression(&rule.conditions, &format!("{}conditions", paths.spec), result);
    schema_checks::validate_auto_resolve(rule, paths.spec, result);
    for (i, condition) in rule.resolution().iter().enumerate() {
        expression_checks::validate_condition(
            condition,
            &format!("{}resolution_conditions[{i}]", paths.spec),
            result,
        );
    }

    if let Some(catalog) = catalog {
        let conditions = rule
            .conditions
            .groups
            .iter()
            .enumerate()
            .flat_map(|(g, group)| {
                group.conditions.iter().enumerate().map(move |(c, condition)| {
                    (format!("{}conditions.groups[{g}].conditions[{c}]", paths.spec), condition)
                })
            })
            .chain(rule.resolution().iter().enumerate().map(|(i, condition)| {
                (format!("{}resolution_conditions[{i}]", paths.spec), condition)
            }));
        for (path, condition) in conditions {
            catalog_checks::validate_against_catalog(condition, catalog, &path, result);
        }
    }
}

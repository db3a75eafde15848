//! Document header, rule identity and auto-resolution checks.

use crate::schema::{Rule, RuleKind};

use super::fuzzy::{is_kebab_case, to_kebab_case};
use super::ValidationResult;

pub(super) fn validate_header(
    api_version: &str,
    kind: &str,
    expected: RuleKind,
    result: &mut ValidationResult,
) {
    if api_version != "v1" {
        result.error(
            "apiVersion",
            format!("apiVersion must be 'v1', got '{api_version}'"),
        );
    }
    if kind != expected.to_string() {
        result.error("kind", format!("kind must be '{expected}', got '{kind}'"));
    }
}

/// `id` must be non-empty kebab-case; `name` must be non-empty.
pub(super) fn validate_identity(id: &str, name: &str, prefix: &str, result: &mut ValidationResult) {
    let id_path = format!("{prefix}id");
    if id.trim().is_empty() {
        result.error(id_path, "id must not be empty");
    } else if !is_kebab_case(id) {
        let suggestion = Some(to_kebab_case(id))
            .filter(|s| !s.is_empty())
            .map(|s| format!("Did you mean '{s}'?"));
        result.error_with_suggestion(
            id_path,
            format!("id must be kebab-case (lowercase alphanumeric + hyphens), got '{id}'"),
            suggestion,
        );
    }

    if name.trim().is_empty() {
        result.error(format!("{prefix}name"), "name must not be empty");
    }
}

pub(super) fn validate_auto_resolve(rule: &Rule, prefix: &str, result: &mut ValidationResult) {
    match (rule.auto_resolve, rule.resolution().is_empty()) {
        (true, true) => result.warn(
            format!("{prefix}auto_resolve"),
            "auto_resolve has no resolution_conditions: alerts resolve once the rule no longer matches",
        ),
        (false, false) => result.warn(
            format!("{prefix}resolution_conditions"),
            "resolution_conditions are ignored because auto_resolve is false",
        ),
        _ => {}
    }
}

//! Checks against a resolved field catalog, and checks of catalog documents.

use std::collections::HashSet;

use redzone_catalog::{AvailableFields, CatalogSpec};

use crate::schema::{Condition, Operator};

use super::fuzzy::did_you_mean;
use super::ValidationResult;

pub(super) fn validate_against_catalog(
    condition: &Condition,
    catalog: &AvailableFields,
    path: &str,
    result: &mut ValidationResult,
) {
    if condition.field.trim().is_empty() {
        return;
    }

    let Some(descriptor) = catalog.find(&condition.field) else {
        let mut message = format!("field '{}' is not in the field catalog", condition.field);
        if let Some(hint) = did_you_mean(&condition.field, catalog.paths()) {
            message.push_str(". ");
            message.push_str(&hint);
        }
        result.warn(format!("{path}.field"), message);
        return;
    };

    if let Some(declared) = condition.field_type {
        if declared != descriptor.field_type {
            result.warn(
                format!("{path}.fieldType"),
                format!(
                    "fieldType '{declared}' differs from catalog type '{}' for '{}'",
                    descriptor.field_type, condition.field
                ),
            );
        }
    }

    if let Some(entity) = condition.entity_type {
        if entity != descriptor.entity_type {
            result.warn(
                format!("{path}.entityType"),
                format!(
                    "entityType '{entity}' differs from catalog entity '{}' for '{}'",
                    descriptor.entity_type, condition.field
                ),
            );
        }
    }

    let ordering = condition
        .operator
        .parse::<Operator>()
        .map(|op| op.is_ordering())
        .unwrap_or(false);
    if ordering && condition.field_type.is_none() && !descriptor.field_type.is_ordered() {
        result.warn(
            format!("{path}.operator"),
            format!(
                "'{}' on {} field '{}' never matches",
                condition.operator, descriptor.field_type, condition.field
            ),
        );
    }
}

pub(super) fn validate_catalog_spec(spec: &CatalogSpec, result: &mut ValidationResult) {
    if spec.sources.is_empty() {
        result.warn("spec.sources", "catalog declares no sources");
    }

    let mut seen = HashSet::new();
    for (s, source) in spec.sources.iter().enumerate() {
        for (c, column) in source.columns.iter().enumerate() {
            let path = format!("spec.sources[{s}].columns[{c}]");
            if column.name.trim().is_empty() {
                result.error(format!("{path}.name"), "column name must not be empty");
                continue;
            }
            if !seen.insert((source.entity, column.name.as_str())) {
                result.warn(
                    format!("{path}.name"),
                    format!(
                        "duplicate column '{}' for {}; the first definition wins",
                        column.name, source.entity
                    ),
                );
            }
        }
    }
}

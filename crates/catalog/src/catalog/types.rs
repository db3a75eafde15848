use std::collections::BTreeMap;

use redzone_core::{EntityType, FieldType};
use serde::{Deserialize, Serialize};

use super::partial::SourceFailure;

/// A single field usable in a rule condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Stable identifier, `"<entity>.<column>"`.
    pub id: String,
    pub label: String,
    pub entity_type: EntityType,
    pub field_type: FieldType,
    /// Record lookup path used by the evaluator.
    pub path: String,
}

/// Fields usable in rules, grouped by entity type.
///
/// Every entity type is present as a key, possibly with an empty list when no
/// source contributed fields or the source failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableFields {
    pub fields: BTreeMap<EntityType, Vec<FieldDescriptor>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_sources: Vec<SourceFailure>,
}

impl Default for AvailableFields {
    fn default() -> Self {
        Self {
            fields: EntityType::ALL.iter().map(|et| (*et, Vec::new())).collect(),
            failed_sources: Vec::new(),
        }
    }
}

impl AvailableFields {
    /// Fields for one entity type (empty if none).
    pub fn get(&self, entity_type: EntityType) -> &[FieldDescriptor] {
        self.fields
            .get(&entity_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Iterate all descriptors in entity order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.values().flatten()
    }

    /// Find a descriptor by its record path, falling back to its id.
    pub fn find(&self, path: &str) -> Option<&FieldDescriptor> {
        self.iter()
            .find(|d| d.path == path)
            .or_else(|| self.iter().find(|d| d.id == path))
    }

    /// All record paths, in entity order.
    pub fn paths(&self) -> Vec<&str> {
        self.iter().map(|d| d.path.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when at least one source could not be read.
    pub fn is_partial(&self) -> bool {
        !self.failed_sources.is_empty()
    }
}

//! Multi-kind rule document container and accessors.

use super::{CommonMetadata, FieldCatalogDocument, RedZoneRuleDocument, RuleKind};

/// A fully deserialized document of any supported kind.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleDocument {
    /// Red Zone rule -- severity, condition tree, auto-resolution.
    RedZone(RedZoneRuleDocument),
    /// Field catalog -- entity sources and their columns.
    FieldCatalog(FieldCatalogDocument),
}

impl RuleDocument {
    /// Get the document's metadata regardless of kind.
    pub fn metadata(&self) -> &CommonMetadata {
        match self {
            RuleDocument::RedZone(doc) => &doc.metadata,
            RuleDocument::FieldCatalog(doc) => &doc.metadata,
        }
    }

    /// Get mutable reference to the document's metadata regardless of kind.
    pub fn metadata_mut(&mut self) -> &mut CommonMetadata {
        match self {
            RuleDocument::RedZone(doc) => &mut doc.metadata,
            RuleDocument::FieldCatalog(doc) => &mut doc.metadata,
        }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            RuleDocument::RedZone(_) => RuleKind::RedZoneRule,
            RuleDocument::FieldCatalog(_) => RuleKind::FieldCatalog,
        }
    }

    pub fn as_red_zone(&self) -> Option<&RedZoneRuleDocument> {
        match self {
            RuleDocument::RedZone(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_field_catalog(&self) -> Option<&FieldCatalogDocument> {
        match self {
            RuleDocument::FieldCatalog(doc) => Some(doc),
            _ => None,
        }
    }

    /// Serialize this document to JSON, delegating to the inner type.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            RuleDocument::RedZone(doc) => serde_json::to_value(doc),
            RuleDocument::FieldCatalog(doc) => serde_json::to_value(doc),
        }
    }

    /// Serialize this document to YAML, delegating to the inner type.
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        match self {
            RuleDocument::RedZone(doc) => serde_yaml::to_string(doc),
            RuleDocument::FieldCatalog(doc) => serde_yaml::to_string(doc),
        }
    }
}

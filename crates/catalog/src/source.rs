//! Field sources: per-entity providers of column metadata.

use redzone_core::{EntityType, FieldType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a source can report while describing its columns.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source for '{entity}' is unavailable: {reason}")]
    Unavailable { entity: EntityType, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

/// Raw metadata for one column as reported by a source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMeta {
    pub name: String,
    /// Storage type as declared by the schema (e.g. `numeric(10,2)`).
    pub declared_type: Option<String>,
    /// Explicitly mapped semantic type; always wins over the declared type.
    pub field_type: Option<FieldType>,
    pub label: Option<String>,
    /// Record lookup path override.
    pub path: Option<String>,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn declared(mut self, declared_type: impl Into<String>) -> Self {
        self.declared_type = Some(declared_type.into());
        self
    }

    pub fn typed(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }
}

/// Provider of column metadata for one entity category.
///
/// Local schema introspection and external mappings (billing provider,
/// company database) each implement this. A source that cannot be reached
/// returns an error; the resolver degrades to a partial catalog.
pub trait FieldSource: Send + Sync {
    fn entity_type(&self) -> EntityType;

    fn describe(&self) -> Result<Vec<ColumnMeta>, SourceError>;
}

// ── Declarative catalog spec ────────────────────────────────────────

/// Declarative description of all catalog sources (the `spec` of a
/// `FieldCatalog` document).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSpec {
    #[serde(default)]
    pub sources: Vec<SourceDef>,
}

/// One source in a [`CatalogSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceDef {
    pub entity: EntityType,
    /// `false` models a source that is currently unreachable.
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
}

/// One column in a [`SourceDef`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnDef {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,
    #[serde(
        default,
        rename = "fieldType",
        alias = "field_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn default_true() -> bool {
    true
}

impl From<&ColumnDef> for ColumnMeta {
    fn from(def: &ColumnDef) -> Self {
        Self {
            name: def.name.clone(),
            declared_type: def.declared_type.clone(),
            field_type: def.field_type,
            label: def.label.clone(),
            path: def.path.clone(),
        }
    }
}

/// In-memory source backed by a fixed column list.
#[derive(Debug, Clone)]
pub struct StaticSource {
    entity_type: EntityType,
    columns: Vec<ColumnMeta>,
    available: bool,
}

impl StaticSource {
    pub fn new(entity_type: EntityType, columns: Vec<ColumnMeta>) -> Self {
        Self {
            entity_type,
            columns,
            available: true,
        }
    }

    /// A source that always fails, for a data source that is offline.
    pub fn unavailable(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            columns: Vec::new(),
            available: false,
        }
    }
}

impl From<&SourceDef> for StaticSource {
    fn from(def: &SourceDef) -> Self {
        Self {
            entity_type: def.entity,
            columns: def.columns.iter().map(ColumnMeta::from).collect(),
            available: def.available,
        }
    }
}

impl FieldSource for StaticSource {
    fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    fn describe(&self) -> Result<Vec<ColumnMeta>, SourceError> {
        if !self.available {
            return Err(SourceError::Unavailable {
                entity: self.entity_type,
                reason: "source marked unavailable".to_string(),
            });
        }
        Ok(self.columns.clone())
    }
}

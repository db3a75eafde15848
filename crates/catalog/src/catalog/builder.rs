use std::collections::HashSet;

use redzone_core::EntityType;
use tracing::{info, warn};

use crate::inference::{humanize_label, resolve_field_type};
use crate::source::{CatalogSpec, ColumnMeta, FieldSource, StaticSource};

use super::partial::SourceFailure;
use super::types::{AvailableFields, FieldDescriptor};

/// Builds an [`AvailableFields`] catalog from a set of field sources.
///
/// Sources are read in registration order. Several sources may feed the same
/// entity; a column name already seen for that entity is skipped.
#[derive(Default)]
pub struct CatalogResolver {
    sources: Vec<Box<dyn FieldSource>>,
}

impl CatalogResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a resolver with one [`StaticSource`] per source definition in `spec`.
    pub fn from_spec(spec: &CatalogSpec) -> Self {
        let mut resolver = Self::new();
        for def in &spec.sources {
            resolver.add_source(Box::new(StaticSource::from(def)));
        }
        resolver
    }

    pub fn add_source(&mut self, source: Box<dyn FieldSource>) {
        self.sources.push(source);
    }

    pub fn with_source(mut self, source: impl FieldSource + 'static) -> Self {
        self.add_source(Box::new(source));
        self
    }

    /// Read every source and produce the catalog.
    ///
    /// A failing source never fails the build: its fields are omitted and the
    /// failure is listed in [`AvailableFields::failed_sources`].
    pub fn resolve(&self) -> AvailableFields {
        let mut catalog = AvailableFields::default();
        let mut seen: HashSet<(EntityType, String)> = HashSet::new();

        for source in &self.sources {
            let entity_type = source.entity_type();
            let columns = match source.describe() {
                Ok(columns) => columns,
                Err(e) => {
                    warn!(entity = %entity_type, error = %e, "field source unavailable, omitting its fields");
                    catalog.failed_sources.push(SourceFailure {
                        entity_type,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let entry = catalog.fields.entry(entity_type).or_default();
            for column in columns {
                if column.name.trim().is_empty() {
                    continue;
                }
                if !seen.insert((entity_type, column.name.clone())) {
                    continue;
                }
                entry.push(describe_column(entity_type, &column));
            }
        }

        info!(
            "Field catalog: {} fields across {} entity types ({} failed sources)",
            catalog.len(),
            catalog.fields.values().filter(|f| !f.is_empty()).count(),
            catalog.failed_sources.len()
        );

        catalog
    }
}

/// Build the descriptor for one column of an entity.
fn describe_column(entity_type: EntityType, column: &ColumnMeta) -> FieldDescriptor {
    let id = format!("{}.{}", entity_type, column.name);
    let path = match &column.path {
        Some(path) => path.clone(),
        None if entity_type == EntityType::Customer => column.name.clone(),
        None => id.clone(),
    };

    FieldDescriptor {
        id,
        label: column
            .label
            .clone()
            .unwrap_or_else(|| humanize_label(&column.name)),
        entity_type,
        field_type: resolve_field_type(column),
        path,
    }
}

//! Field catalog resolver.
//!
//! Introspects the fields available to Red Zone rules across local customer
//! columns, computed metrics and externally mapped billing/company fields,
//! and produces a typed catalog grouped by entity type.

pub mod catalog;
pub mod inference;
pub mod source;

pub use catalog::{AvailableFields, CatalogResolver, FieldDescriptor, SourceFailure};
pub use inference::{infer_from_name, map_storage_type, resolve_field_type};
pub use source::{CatalogSpec, ColumnDef, ColumnMeta, FieldSource, SourceDef, SourceError, StaticSource};

//! `FieldCatalog` documents describing the sources of rule-authoring fields.

use redzone_catalog::{CatalogResolver, CatalogSpec};
use serde::{Deserialize, Serialize};

use super::CommonMetadata;

/// On-disk `FieldCatalog` document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FieldCatalogDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: CatalogSpec,
}

impl FieldCatalogDocument {
    /// A resolver with one static source per declared source.
    pub fn resolver(&self) -> CatalogResolver {
        CatalogResolver::from_spec(&self.spec)
    }
}

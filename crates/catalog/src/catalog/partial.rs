use redzone_core::EntityType;
use serde::{Deserialize, Serialize};

/// A source that could not be read during a catalog build.
///
/// The catalog is still returned; this entity's fields from the failing
/// source are simply absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFailure {
    pub entity_type: EntityType,
    pub error: String,
}

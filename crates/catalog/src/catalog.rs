mod builder;
mod partial;
mod types;


pub use builder::CatalogResolver;
pub use partial::SourceFailure;
pub use types::{AvailableFields, FieldDescriptor};

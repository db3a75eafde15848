//! Rule document schema types with serde deserialization.
//!
//! Defines the type hierarchy for rule documents:
//! - `RuleEnvelope`: lightweight first-pass header (apiVersion, kind, metadata)
//! - `RuleDocument`: enum dispatching to kind-specific types
//! - `RedZoneRuleDocument` / `Rule`: at-risk rules with severity and auto-resolution
//! - `FieldCatalogDocument`: field catalog sources for rule authoring
//! - `RuleExpression` / `ConditionGroup` / `Condition`: the two-level condition tree

mod composition;
mod condition;
mod document;
mod envelope;
mod field_catalog;
mod kind;
mod metadata;
mod rule;

pub use composition::*;
pub use condition::*;
pub use document::*;
pub use envelope::*;
pub use field_catalog::*;
pub use kind::*;
pub use metadata::*;
pub use rule::*;

#[cfg(test)]
mod tests;

//! Rule kind enum for two-pass deserialization dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported document kinds for two-pass deserialization dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    RedZoneRule,
    FieldCatalog,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::RedZoneRule => write!(f, "RedZoneRule"),
            RuleKind::FieldCatalog => write!(f, "FieldCatalog"),
        }
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "RedZoneRule" => Ok(RuleKind::RedZoneRule),
            "FieldCatalog" => Ok(RuleKind::FieldCatalog),
            other => Err(format!("unknown rule kind: '{}'", other)),
        }
    }
}

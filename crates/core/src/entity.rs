use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Data source category a field belongs to.
///
/// Declaration order is the catalog output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Customer,
    CustomerMetrics,
    Subscription,
    Invoice,
    Company,
}

impl EntityType {
    pub const ALL: [EntityType; 5] = [
        EntityType::Customer,
        EntityType::CustomerMetrics,
        EntityType::Subscription,
        EntityType::Invoice,
        EntityType::Company,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Customer => "customer",
            EntityType::CustomerMetrics => "customer_metrics",
            EntityType::Subscription => "subscription",
            EntityType::Invoice => "invoice",
            EntityType::Company => "company",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "customer" => Ok(EntityType::Customer),
            "customer_metrics" => Ok(EntityType::CustomerMetrics),
            "subscription" => Ok(EntityType::Subscription),
            "invoice" => Ok(EntityType::Invoice),
            "company" => Ok(EntityType::Company),
            other => Err(format!("unknown entity type: '{}'", other)),
        }
    }
}

/// Semantic type of a field, used for coercion during rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Date,
    Boolean,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
        }
    }

    /// Number and date values have a total order; strings and booleans do not
    /// take part in `greater_than` / `less_than` / `in_range`.
    pub fn is_ordered(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Date)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "string" => Ok(FieldType::String),
            "number" => Ok(FieldType::Number),
            "date" => Ok(FieldType::Date),
            "boolean" => Ok(FieldType::Boolean),
            other => Err(format!("unknown field type: '{}'", other)),
        }
    }
}

//! Red Zone rules: severity, conditions and auto-resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::metadata::default_true;
use super::{CommonMetadata, Condition, RuleExpression, RuleKind};

/// Alert severity. Ordered: `Critical > HighRisk > AttentionNeeded`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    AttentionNeeded,
    HighRisk,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::AttentionNeeded => "attention_needed",
            Severity::HighRisk => "high_risk",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "attention_needed" => Ok(Severity::AttentionNeeded),
            "high_risk" => Ok(Severity::HighRisk),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity: '{}'", other)),
        }
    }
}

/// A Red Zone rule as evaluated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub severity: Severity,
    pub conditions: RuleExpression,
    #[serde(default)]
    pub auto_resolve: bool,
    /// Flat list, implicitly ANDed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_conditions: Option<Vec<Condition>>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Rule {
    pub fn new(id: &str, name: &str, severity: Severity, conditions: RuleExpression) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            severity,
            conditions,
            auto_resolve: false,
            resolution_conditions: None,
            enabled: true,
        }
    }

    /// Enable auto-resolution with the given resolution conditions (may be empty).
    pub fn resolving_when(mut self, conditions: Vec<Condition>) -> Self {
        self.auto_resolve = true;
        self.resolution_conditions = if conditions.is_empty() {
            None
        } else {
            Some(conditions)
        };
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Resolution conditions, empty when none are configured.
    pub fn resolution(&self) -> &[Condition] {
        self.resolution_conditions.as_deref().unwrap_or(&[])
    }
}

/// `spec` section of a `RedZoneRule` document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RedZoneSpec {
    pub severity: Severity,
    pub conditions: RuleExpression,
    #[serde(default)]
    pub auto_resolve: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_conditions: Option<Vec<Condition>>,
}

/// On-disk `RedZoneRule` document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RedZoneRuleDocument {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: CommonMetadata,
    pub spec: RedZoneSpec,
}

impl RedZoneRuleDocument {
    /// The engine-facing rule: identity and enablement come from metadata.
    pub fn to_rule(&self) -> Rule {
        Rule {
            id: self.metadata.id.clone(),
            name: self.metadata.name.clone(),
            description: self.metadata.description.clone(),
            severity: self.spec.severity,
            conditions: self.spec.conditions.clone(),
            auto_resolve: self.spec.auto_resolve,
            resolution_conditions: self.spec.resolution_conditions.clone(),
            enabled: self.metadata.enabled,
        }
    }

    /// Wrap a rule in a `v1` document.
    pub fn from_rule(rule: &Rule) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: RuleKind::RedZoneRule.to_string(),
            metadata: CommonMetadata {
                id: rule.id.clone(),
                name: rule.name.clone(),
                description: rule.description.clone(),
                tags: None,
                enabled: rule.enabled,
            },
            spec: RedZoneSpec {
                severity: rule.severity,
                conditions: rule.conditions.clone(),
                auto_resolve: rule.auto_resolve,
                resolution_conditions: rule.resolution_conditions.clone(),
            },
        }
    }
}

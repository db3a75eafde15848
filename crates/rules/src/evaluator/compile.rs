//! Rule compilation: validated raw rules become typed, evaluable rules.

use redzone_core::Record;

use crate::schema::{Rule, Severity};
use crate::validation::{validate_rule, SchemaError};

use super::composition::CompiledExpression;
use super::predicate::CompiledCondition;

/// How an open alert for this rule gets closed automatically.
#[derive(Debug, Clone, PartialEq)]
pub enum AutoResolve {
    /// Only manual resolution.
    Disabled,
    /// Resolve when every resolution condition holds.
    WhenConditionsMatch(Vec<CompiledCondition>),
    /// No resolution conditions: resolve once the rule stops matching.
    WhenRuleClears,
}

/// A rule ready for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    pub id: String,
    pub name: String,
    pub severity: Severity,
    pub enabled: bool,
    pub expression: CompiledExpression,
    pub auto_resolve: AutoResolve,
}

impl Rule {
    /// Validate and compile. All validation errors are reported at once.
    pub fn compile(&self) -> Result<CompiledRule, SchemaError> {
        let result = validate_rule(self, None);
        if !result.valid {
            return Err(SchemaError::Invalid {
                rule_id: self.id.clone(),
                errors: result.errors,
            });
        }

        let auto_resolve = match (self.auto_resolve, self.resolution()) {
            (false, _) => AutoResolve::Disabled,
            (true, []) => AutoResolve::WhenRuleClears,
            (true, conditions) => AutoResolve::WhenConditionsMatch(
                conditions
                    .iter()
                    .map(CompiledCondition::compile)
                    .collect::<Result<_, _>>()?,
            ),
        };

        Ok(CompiledRule {
            id: self.id.clone(),
            name: self.name.clone(),
            severity: self.severity,
            enabled: self.enabled,
            expression: CompiledExpression::compile(&self.conditions)?,
            auto_resolve,
        })
    }
}

impl CompiledRule {
    pub fn matches(&self, record: &Record) -> bool {
        self.enabled && self.expression.matches(record)
    }

    /// Whether an open alert raised by this rule should close for `record`.
    pub fn should_auto_resolve(&self, record: &Record) -> bool {
        match &self.auto_resolve {
            AutoResolve::Disabled => false,
            AutoResolve::WhenConditionsMatch(conditions) => {
                conditions.iter().all(|c| c.evaluate(record))
            }
            AutoResolve::WhenRuleClears => !self.expression.matches(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Condition, RuleExpression};
    use serde_json::json;

    fn at_risk() -> Rule {
        Rule::new(
            "at-risk",
            "At risk",
            Severity::Critical,
            RuleExpression::all_of(vec![Condition::new("health_status", "equals", "at_risk")]),
        )
    }

    #[test]
    fn compile_reports_all_errors() {
        let mut rule = at_risk();
        rule.id = "At Risk".into();
        rule.conditions.groups[0].conditions.push(Condition::new("", "equal", "x"));

        match rule.compile() {
            Err(SchemaError::Invalid { rule_id, errors }) => {
                assert_eq!(rule_id, "At Risk");
                assert!(errors.len() >= 3, "{errors:?}");
            }
            other => panic!("expected invalid rule, got {other:?}"),
        }
    }

    #[test]
    fn auto_resolve_modes() {
        let plain = at_risk().compile().unwrap();
        assert_eq!(plain.auto_resolve, AutoResolve::Disabled);

        let clears = at_risk().resolving_when(vec![]).compile().unwrap();
        assert_eq!(clears.auto_resolve, AutoResolve::WhenRuleClears);
        let healthy = Record::from_value(json!({"health_status": "healthy"})).unwrap();
        let risky = Record::from_value(json!({"health_status": "at_risk"})).unwrap();
        assert!(clears.should_auto_resolve(&healthy));
        assert!(!clears.should_auto_resolve(&risky));

        let explicit = at_risk()
            .resolving_when(vec![Condition::new("health_status", "equals", "healthy")])
            .compile()
            .unwrap();
        assert!(matches!(explicit.auto_resolve, AutoResolve::WhenConditionsMatch(ref c) if c.len() == 1));
        assert!(explicit.should_auto_resolve(&healthy));
        let unknown = Record::from_value(json!({"health_status": "unknown"})).unwrap();
        assert!(!explicit.should_auto_resolve(&unknown));
        assert!(!plain.should_auto_resolve(&healthy));
    }

    #[test]
    fn disabled_rule_never_matches() {
        let rule = at_risk().disabled().compile().unwrap();
        let risky = Record::from_value(json!({"health_status": "at_risk"})).unwrap();
        assert!(!rule.matches(&risky));
    }
}

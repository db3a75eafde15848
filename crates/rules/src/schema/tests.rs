//! Tests for schema types.

use super::*;
use redzone_core::{EntityType, FieldType};

const AT_RISK_YAML: &str = r#"
apiVersion: v1
kind: RedZoneRule
metadata:
  id: at-risk-health
  name: At-risk health status
  description: Customer success marked the account at risk
  tags: [health]
spec:
  severity: critical
  conditions:
    logicOperator: AND
    groups:
      - logicOperator: AND
        conditions:
          - field: health_status
            operator: equals
            value: at_risk
            entityType: customer
            fieldType: string
  auto_resolve: true
  resolution_conditions:
    - field: health_status
      operator: equals
      value: healthy
"#;

const ENGAGEMENT_YAML: &str = r#"
apiVersion: v1
kind: RedZoneRule
metadata:
  id: low-engagement
  name: Low engagement
  enabled: false
spec:
  severity: attention_needed
  conditions:
    logicOperator: or
    groups:
      - logicOperator: and
        conditions:
          - field: customer_metrics.nps
            operator: less_than
            value: 5
      - logicOperator: AND
        conditions:
          - field: customer_metrics.days_since_campaign
            operator: in_range
            value: [60, 365]
"#;

const CATALOG_YAML: &str = r#"
apiVersion: v1
kind: FieldCatalog
metadata:
  id: default-catalog
  name: Default field catalog
spec:
  sources:
    - entity: customer
      columns:
        - name: health_status
          type: varchar(32)
    - entity: subscription
      columns:
        - name: total_amount
        - name: status
          fieldType: string
"#;

#[test]
fn parse_red_zone_rule_document() {
    let doc: RedZoneRuleDocument = serde_yaml::from_str(AT_RISK_YAML).unwrap();
    assert_eq!(doc.api_version, "v1");
    assert_eq!(doc.metadata.id, "at-risk-health");
    assert!(doc.metadata.enabled);
    assert_eq!(doc.spec.severity, Severity::Critical);
    assert!(doc.spec.auto_resolve);

    let group = &doc.spec.conditions.groups[0];
    assert_eq!(group.logic_operator, LogicOperator::And);
    let cond = &group.conditions[0];
    assert_eq!(cond.field, "health_status");
    assert_eq!(cond.entity_type, Some(EntityType::Customer));
    assert_eq!(cond.field_type, Some(FieldType::String));
    assert_eq!(cond.value.as_ref().and_then(|v| v.text()).as_deref(), Some("at_risk"));
}

#[test]
fn document_converts_to_rule() {
    let doc: RedZoneRuleDocument = serde_yaml::from_str(AT_RISK_YAML).unwrap();
    let rule = doc.to_rule();
    assert_eq!(rule.id, "at-risk-health");
    assert_eq!(rule.name, "At-risk health status");
    assert_eq!(rule.resolution().len(), 1);
    assert!(rule.enabled);

    let back = RedZoneRuleDocument::from_rule(&rule);
    assert_eq!(back.to_rule(), rule);
    assert_eq!(back.kind, "RedZoneRule");
}

#[test]
fn lowercase_logic_operators_and_numeric_values() {
    let doc: RedZoneRuleDocument = serde_yaml::from_str(ENGAGEMENT_YAML).unwrap();
    let expr = &doc.spec.conditions;
    assert_eq!(expr.logic_operator, LogicOperator::Or);
    assert_eq!(expr.groups.len(), 2);
    assert!(!doc.to_rule().enabled);

    let nps = &expr.groups[0].conditions[0];
    assert_eq!(nps.value.as_ref().and_then(|v| v.text()).as_deref(), Some("5"));

    let range = &expr.groups[1].conditions[0];
    let bounds = range.value.as_ref().and_then(|v| v.bounds()).unwrap();
    assert_eq!(bounds, ("60".to_string(), "365".to_string()));
}

#[test]
fn range_bounds_from_comma_string() {
    let value = ConditionValue::Single(Literal::Text("1, 10".into()));
    assert_eq!(value.bounds(), Some(("1".to_string(), "10".to_string())));

    let bad = ConditionValue::Single(Literal::Text("1,2,3".into()));
    assert_eq!(bad.bounds(), None);

    let single = ConditionValue::Pair(vec![Literal::Number(1.0)]);
    assert_eq!(single.bounds(), None);
}

#[test]
fn literal_text_forms() {
    assert_eq!(Literal::Number(5.0).to_text(), "5");
    assert_eq!(Literal::Number(2.5).to_text(), "2.5");
    assert_eq!(Literal::Bool(true).to_text(), "true");
    assert_eq!(Literal::Text("abc".into()).to_text(), "abc");
}

#[test]
fn unknown_fields_are_rejected() {
    let yaml = AT_RISK_YAML.replace("auto_resolve: true", "auto_resolve: true\n  priority: 3");
    let result: Result<RedZoneRuleDocument, _> = serde_yaml::from_str(&yaml);
    assert!(result.is_err());
}

#[test]
fn severity_ordering() {
    assert!(Severity::Critical > Severity::HighRisk);
    assert!(Severity::HighRisk > Severity::AttentionNeeded);
    assert_eq!("high_risk".parse::<Severity>().unwrap(), Severity::HighRisk);
    assert!("urgent".parse::<Severity>().is_err());
}

#[test]
fn operator_names_round_trip() {
    for name in OPERATOR_NAMES {
        let op: Operator = name.parse().unwrap();
        assert_eq!(op.as_str(), *name);
    }
    assert!("equal".parse::<Operator>().is_err());
    assert!(!Operator::IsEmpty.takes_value());
    assert!(Operator::InRange.is_ordering());
}

#[test]
fn envelope_two_pass_red_zone() {
    let envelope: RuleEnvelope = serde_yaml::from_str(AT_RISK_YAML).unwrap();
    assert_eq!(envelope.rule_kind().unwrap(), RuleKind::RedZoneRule);
    let doc = envelope.parse_full().unwrap();
    assert_eq!(doc.kind(), RuleKind::RedZoneRule);
    assert_eq!(doc.metadata().id, "at-risk-health");
    assert!(doc.as_red_zone().is_some());
    assert!(doc.as_field_catalog().is_none());
}

#[test]
fn envelope_two_pass_field_catalog() {
    let envelope: RuleEnvelope = serde_yaml::from_str(CATALOG_YAML).unwrap();
    let doc = envelope.parse_full().unwrap();
    let catalog_doc = doc.as_field_catalog().unwrap();
    assert_eq!(catalog_doc.spec.sources.len(), 2);

    let catalog = catalog_doc.resolver().resolve();
    let total = catalog.find("subscription.total_amount").unwrap();
    assert_eq!(total.field_type, FieldType::Number);
    let status = catalog.find("subscription.status").unwrap();
    assert_eq!(status.field_type, FieldType::String);
}

#[test]
fn envelope_unknown_kind() {
    let yaml = AT_RISK_YAML.replace("kind: RedZoneRule", "kind: AlertPolicy");
    let envelope: RuleEnvelope = serde_yaml::from_str(&yaml).unwrap();
    assert!(envelope.rule_kind().is_err());
    assert!(envelope.parse_full().is_err());
}

#[test]
fn json_documents_parse_like_yaml() {
    let doc: RedZoneRuleDocument = serde_yaml::from_str(AT_RISK_YAML).unwrap();
    let json = RuleDocument::RedZone(doc.clone()).to_json().unwrap();
    assert_eq!(json["spec"]["conditions"]["logicOperator"], "AND");
    assert_eq!(json["spec"]["severity"], "critical");

    let text = serde_json::to_string(&json).unwrap();
    let envelope: RuleEnvelope = serde_yaml::from_str(&text).unwrap();
    assert_eq!(envelope.parse_full().unwrap(), RuleDocument::RedZone(doc));
}

#[test]
fn yaml_round_trip_preserves_document() {
    let doc: RedZoneRuleDocument = serde_yaml::from_str(ENGAGEMENT_YAML).unwrap();
    let yaml = RuleDocument::RedZone(doc.clone()).to_yaml().unwrap();
    let back: RedZoneRuleDocument = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(back, doc);
}

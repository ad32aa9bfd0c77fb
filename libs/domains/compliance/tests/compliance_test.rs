use core_config::Environment;
use domain_architecture::{normalize, ArchitectureGraph};
use domain_compliance::{
    ComplianceEngine, ComplianceReport, EnforcementTable, RuleCatalog, Severity,
};
use serde_json::json;
use std::sync::Arc;
use test_utils::fixtures;
use test_utils::GraphBuilder;

fn evaluate_with(catalog: RuleCatalog, graph: &ArchitectureGraph, environment: Environment) -> ComplianceReport {
    let normalized = normalize(graph);
    ComplianceEngine::new(Arc::new(catalog), Arc::new(EnforcementTable::default()))
        .evaluate(&normalized.resources, environment)
        .unwrap()
}

fn evaluate(graph: &ArchitectureGraph, environment: Environment) -> ComplianceReport {
    evaluate_with(RuleCatalog::builtin(), graph, environment)
}

#[test]
fn test_open_key_vault_single_rule() {
    let catalog = RuleCatalog::builtin().only(&["AZ-KV-001"]);
    let report = evaluate_with(catalog, &fixtures::open_key_vault_graph(), Environment::Production);

    assert_eq!(report.findings.len(), 1);
    let finding = &report.findings[0];
    assert_eq!(finding.rule_id, "AZ-KV-001");
    assert_eq!(finding.severity, Severity::Violation);
    assert_eq!(finding.resource_id.as_deref(), Some("secrets"));
    assert!(finding.remediation.as_deref().is_some_and(|text| !text.is_empty()));
    assert_eq!(report.count(Severity::Violation), 1);
    assert!(!report.compliant);
}

#[test]
fn test_open_key_vault_full_catalog() {
    let report = evaluate(&fixtures::open_key_vault_graph(), Environment::Production);

    assert_eq!(report.findings_for("AZ-KV-001").count(), 1);
    assert_eq!(report.count(Severity::Violation), 1);
    assert_eq!(report.count(Severity::Critical), 0);
    assert_eq!(report.rules_evaluated, RuleCatalog::builtin().len());
    assert_eq!(report.catalog_version, domain_compliance::BUILTIN_CATALOG_VERSION);

    let tallied: usize = report.summary_counts.values().sum();
    assert_eq!(tallied, report.findings.len());
    assert_eq!(report.summary_counts.len(), 4);
}

#[test]
fn test_closed_key_vault_is_compliant() {
    let graph = GraphBuilder::new()
        .resource_with(
            "Key Vault",
            "secrets",
            Some("standard"),
            json!({
                "publicNetworkAccess": "Disabled",
                "enablePurgeProtection": true,
                "tags": { "owner": "platform" }
            }),
        )
        .build();

    let report = evaluate(&graph, Environment::Production);
    assert!(report.findings.is_empty(), "{:?}", report.findings);
    assert!(report.compliant);
}

#[test]
fn test_relationships_never_become_findings() {
    let graph = fixtures::forwarding_graph();
    let normalized = normalize(&graph);
    let report = evaluate(&graph, Environment::Production);

    for finding in &report.findings {
        if let Some(resource_id) = &finding.resource_id {
            assert!(
                normalized.resource(resource_id).is_some(),
                "finding for unknown resource {resource_id}"
            );
            assert_ne!(resource_id, "edge-to-web");
        }
    }
}

#[test]
fn test_graph_rules_report_without_resource() {
    let report = evaluate(&fixtures::web_app_graph(), Environment::Production);

    let missing_vault: Vec<_> = report.findings_for("AZ-SEC-001").collect();
    assert_eq!(missing_vault.len(), 1);
    assert_eq!(missing_vault[0].resource_id, None);
    assert!(missing_vault[0].message.contains("web"));
}

#[test]
fn test_development_suppresses_warnings() {
    let production = evaluate(&fixtures::open_key_vault_graph(), Environment::Production);
    let development = evaluate(&fixtures::open_key_vault_graph(), Environment::Development);

    assert!(development.findings.iter().all(|f| f.severity >= Severity::Violation));
    assert_eq!(
        development.findings.len() + development.suppressed_findings,
        production.findings.len() + production.suppressed_findings
    );
    assert_eq!(development.findings_for("AZ-KV-001").count(), 1);
    assert!(!development.compliant);
}

#[test]
fn test_remediation_actions_follow_surfaced_findings() {
    let report = evaluate(&fixtures::open_key_vault_graph(), Environment::Production);

    let action = report
        .remediation_actions
        .iter()
        .find(|action| action.rule_id == "AZ-KV-001")
        .unwrap();
    assert_eq!(action.resource_id, "secrets");
    assert_eq!(
        action.proposed_property_changes.get("networkAcls.bypass"),
        Some(&json!("AzureServices"))
    );

    let tags = report
        .remediation_actions
        .iter()
        .find(|action| action.rule_id == "AZ-GOV-001")
        .unwrap();
    assert_eq!(
        tags.proposed_property_changes.get("tags.environment"),
        Some(&json!("production"))
    );

    for action in &report.remediation_actions {
        assert!(report
            .findings
            .iter()
            .any(|f| f.rule_id == action.rule_id && f.auto_fixable));
    }
}

#[test]
fn test_evaluation_is_deterministic() {
    let first = evaluate(&fixtures::web_app_graph(), Environment::Staging);
    let second = evaluate(&fixtures::web_app_graph(), Environment::Staging);

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

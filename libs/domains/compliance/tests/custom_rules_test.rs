use core_config::Environment;
use domain_architecture::normalize;
use domain_compliance::{
    ComplianceEngine, DirectoryRuleSource, EnforcementTable, RuleCatalog, RuleOrigin, RuleSource,
    Severity, BUILTIN_CATALOG_VERSION,
};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use test_utils::fixtures;

const DENY_PUBLIC_VAULTS: &str = r#"{
  "properties": {
    "displayName": "Deny public Key Vaults",
    "metadata": { "category": "Key Vault" },
    "parameters": {
      "effect": { "type": "String", "defaultValue": "Deny" }
    },
    "policyRule": {
      "if": {
        "allOf": [
          { "field": "type", "equals": "Microsoft.KeyVault/vaults" },
          { "field": "Microsoft.KeyVault/vaults/publicNetworkAccess", "notEquals": "Disabled" }
        ]
      },
      "then": { "effect": "[parameters('effect')]" }
    }
  }
}"#;

const REQUIRE_COST_CENTER: &str = r#"[
  {
    "displayName": "Require a cost center tag",
    "policyRule": {
      "if": { "field": "tags['costCenter']", "exists": false },
      "then": { "effect": "audit" }
    }
  }
]"#;

fn policy_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

#[test]
fn test_directory_source_loads_in_file_order() {
    let dir = policy_dir(&[
        ("b-tags.json", REQUIRE_COST_CENTER),
        ("a-vaults.json", DENY_PUBLIC_VAULTS),
        ("notes.txt", "not a policy"),
    ]);

    let rules = DirectoryRuleSource::new(dir.path()).load().unwrap();

    let ids: Vec<_> = rules.iter().map(|rule| rule.id.as_str()).collect();
    assert_eq!(ids, vec!["CUSTOM-a-vaults-1", "CUSTOM-b-tags-1"]);
    assert_eq!(rules[0].severity, Severity::Critical);
    assert_eq!(
        rules[1].origin,
        RuleOrigin::Custom {
            file: "b-tags.json".to_string()
        }
    );
}

#[test]
fn test_unreadable_file_is_skipped() {
    let dir = policy_dir(&[
        ("a-broken.json", "{ this is not json"),
        ("b-tags.json", REQUIRE_COST_CENTER),
    ]);

    let rules = DirectoryRuleSource::new(dir.path()).load().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].id, "CUSTOM-b-tags-1");
}

#[test]
fn test_missing_directory_is_an_error() {
    let dir = TempDir::new().unwrap();
    let source = DirectoryRuleSource::new(dir.path().join("absent"));
    assert!(source.load().is_err());

    let sources: [&dyn RuleSource; 1] = [&source];
    assert_eq!(RuleCatalog::load(&sources), RuleCatalog::builtin());
}

#[test]
fn test_custom_rules_are_evaluated_after_builtin() {
    let dir = policy_dir(&[("a-vaults.json", DENY_PUBLIC_VAULTS)]);
    let source = DirectoryRuleSource::new(dir.path());
    let sources: [&dyn RuleSource; 1] = [&source];
    let catalog = RuleCatalog::load(&sources);
    assert_eq!(catalog.version(), format!("{BUILTIN_CATALOG_VERSION}+custom.1"));

    let normalized = normalize(&fixtures::open_key_vault_graph());
    let report = ComplianceEngine::new(Arc::new(catalog), Arc::new(EnforcementTable::default()))
        .evaluate(&normalized.resources, Environment::Development)
        .unwrap();

    let custom: Vec<_> = report.findings_for("CUSTOM-a-vaults-1").collect();
    assert_eq!(custom.len(), 1);
    assert_eq!(custom[0].severity, Severity::Critical);
    assert_eq!(custom[0].resource_id.as_deref(), Some("secrets"));
    assert_eq!(report.findings.last().map(|f| f.rule_id.as_str()), Some("CUSTOM-a-vaults-1"));
}

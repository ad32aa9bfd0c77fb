//! Organization rules from Azure Policy definition files.
//!
//! Each `*.json` file holds one definition or an array of them. The `if` block
//! describes the non-compliant state, so the stored check is its negation.
//! `[parameters('x')]` references resolve to the parameter's `defaultValue`.

use crate::catalog::RuleSource;
use crate::condition::{Condition, FieldTest};
use crate::error::{ComplianceError, ComplianceResult};
use crate::models::{RuleCategory, Severity};
use crate::rule::{PolicyRule, RuleCheck, RuleOrigin};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Loads every `*.json` policy file in a directory, in file name order.
#[derive(Debug, Clone)]
pub struct DirectoryRuleSource {
    dir: PathBuf,
}

impl DirectoryRuleSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl RuleSource for DirectoryRuleSource {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn load(&self) -> ComplianceResult<Vec<PolicyRule>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|source| ComplianceError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            })
            .collect();
        files.sort();

        let mut rules = Vec::new();
        for path in files {
            match load_file(&path) {
                Ok(loaded) => {
                    debug!(file = %path.display(), rules = loaded.len(), "Loaded policy file");
                    rules.extend(loaded);
                }
                Err(err) => warn!(file = %path.display(), error = %err, "Skipping policy file"),
            }
        }
        Ok(rules)
    }
}

fn load_file(path: &Path) -> ComplianceResult<Vec<PolicyRule>> {
    let contents = std::fs::read_to_string(path).map_err(|source| ComplianceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "policy".to_string());
    parse_policy_document(&stem, &contents)
}

/// Parse one file's contents. Definitions that cannot be converted are
/// skipped with a warning; the file fails only when it is not JSON at all.
pub fn parse_policy_document(stem: &str, contents: &str) -> ComplianceResult<Vec<PolicyRule>> {
    let document: Value = serde_json::from_str(contents)?;
    let definitions = match document {
        Value::Array(items) => items,
        Value::Object(_) => vec![document],
        _ => {
            return Err(ComplianceError::InvalidPolicy(format!(
                "{stem}: expected an object or an array of objects"
            )));
        }
    };

    let mut rules = Vec::new();
    for (index, definition) in definitions.iter().enumerate() {
        match parse_definition(stem, index + 1, definition) {
            Ok(rule) => rules.push(rule),
            Err(err) => warn!(file = stem, index = index + 1, error = %err, "Skipping policy definition"),
        }
    }
    Ok(rules)
}

/// Convert a single Azure Policy definition. Accepts either the bare
/// definition or one wrapped in `properties`.
pub fn parse_definition(stem: &str, position: usize, definition: &Value) -> ComplianceResult<PolicyRule> {
    let definition = definition.get("properties").unwrap_or(definition);
    let Value::Object(object) = definition else {
        return Err(ComplianceError::InvalidPolicy(format!(
            "definition {position} is not an object"
        )));
    };

    let defaults = parameter_defaults(object);
    let resolve = |value: &Value| resolve_parameters(value, &defaults);

    let name = object
        .get("displayName")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{stem} #{position}"));
    let description = object
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let category = object
        .get("metadata")
        .and_then(|metadata| metadata.get("category"))
        .and_then(Value::as_str)
        .map(RuleCategory::from_policy_category)
        .unwrap_or_default();

    let policy_rule = object
        .get("policyRule")
        .ok_or_else(|| ComplianceError::InvalidPolicy(format!("'{name}' has no policyRule")))?;
    let violation = policy_rule
        .get("if")
        .map(&resolve)
        .ok_or_else(|| ComplianceError::InvalidPolicy(format!("'{name}' has no policyRule.if")))?;
    let then = policy_rule.get("then").map(&resolve).unwrap_or(Value::Null);

    let effect = then
        .get("effect")
        .and_then(Value::as_str)
        .unwrap_or("Audit")
        .to_string();
    let (severity, enabled) = effect_severity(&effect);

    let condition = convert_condition(&violation)?;
    let auto_fix = modify_operations(&then);

    Ok(PolicyRule {
        id: format!("CUSTOM-{stem}-{position}"),
        name,
        description,
        category,
        check: RuleCheck::Resource {
            applies_to: Vec::new(),
            condition: Condition::negate(condition),
        },
        severity,
        message_template: "{{rule_name}}: '{{resource_name}}' does not comply (effect: "
            .to_string()
            + &effect
            + ")",
        remediation_template: Some(
            "Review and modify '{{resource_name}}' to comply with {{rule_name}}".to_string(),
        ),
        auto_fix,
        enabled,
        origin: RuleOrigin::Custom {
            file: format!("{stem}.json"),
        },
    })
}

/// Deny → critical, DeployIfNotExists → violation, Modify/Audit/AuditIfNotExists
/// → warning, Disabled → rule disabled. Unrecognized effects audit.
pub fn effect_severity(effect: &str) -> (Severity, bool) {
    match effect.to_ascii_lowercase().as_str() {
        "deny" => (Severity::Critical, true),
        "deployifnotexists" => (Severity::Violation, true),
        "modify" | "audit" | "auditifnotexists" | "append" => (Severity::Warning, true),
        "disabled" => (Severity::Info, false),
        _ => (Severity::Warning, true),
    }
}

fn parameter_defaults(object: &Map<String, Value>) -> BTreeMap<String, Value> {
    object
        .get("parameters")
        .and_then(Value::as_object)
        .map(|parameters| {
            parameters
                .iter()
                .filter_map(|(name, spec)| {
                    spec.get("defaultValue")
                        .map(|value| (name.to_ascii_lowercase(), value.clone()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Replaces `[parameters('x')]` strings with the parameter default.
fn resolve_parameters(value: &Value, defaults: &BTreeMap<String, Value>) -> Value {
    match value {
        Value::String(text) => parameter_reference(text)
            .and_then(|name| defaults.get(&name.to_ascii_lowercase()))
            .cloned()
            .unwrap_or_else(|| value.clone()),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| resolve_parameters(item, defaults))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), resolve_parameters(item, defaults)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn parameter_reference(text: &str) -> Option<&str> {
    text.trim()
        .strip_prefix("[parameters(")?
        .strip_suffix(")]")
        .map(|name| name.trim().trim_matches(|c| c == '\'' || c == '"'))
}

/// Azure field names to node paths. Aliases such as
/// `Microsoft.KeyVault/vaults/networkAcls.defaultAction` keep only the
/// property part; `tags['x']` becomes `tags.x`.
pub fn field_path(field: &str) -> String {
    let field = field.trim();
    if let Some(tag) = field
        .strip_prefix("tags['")
        .and_then(|rest| rest.strip_suffix("']"))
        .or_else(|| field.strip_prefix("tags[").and_then(|rest| rest.strip_suffix(']')))
    {
        return format!("tags.{tag}");
    }
    if field.contains('/') {
        let property = field.rsplit('/').next().unwrap_or(field);
        return property.to_string();
    }
    field.to_string()
}

fn convert_condition(value: &Value) -> ComplianceResult<Condition> {
    let Value::Object(object) = value else {
        return Err(ComplianceError::InvalidPolicy(format!(
            "condition must be an object, got {value}"
        )));
    };

    if let Some(items) = object.get("allOf") {
        return Ok(Condition::AllOf(convert_list(items)?));
    }
    if let Some(items) = object.get("anyOf") {
        return Ok(Condition::AnyOf(convert_list(items)?));
    }
    if let Some(inner) = object.get("not") {
        return Ok(Condition::negate(convert_condition(inner)?));
    }

    let field = object
        .get("field")
        .and_then(Value::as_str)
        .ok_or_else(|| ComplianceError::InvalidPolicy(format!("unsupported condition {value}")))?;
    let path = field_path(field);

    let (operator, operand) = object
        .iter()
        .find(|(key, _)| key.as_str() != "field")
        .ok_or_else(|| ComplianceError::InvalidPolicy(format!("condition on '{field}' has no operator")))?;

    let list = |operand: &Value| -> ComplianceResult<Vec<Value>> {
        operand.as_array().cloned().ok_or_else(|| {
            ComplianceError::InvalidPolicy(format!("'{operator}' on '{field}' expects an array"))
        })
    };
    let number = |operand: &Value| -> ComplianceResult<f64> {
        operand
            .as_f64()
            .or_else(|| operand.as_str().and_then(|text| text.parse().ok()))
            .ok_or_else(|| {
                ComplianceError::InvalidPolicy(format!("'{operator}' on '{field}' expects a number"))
            })
    };
    let text = |operand: &Value| -> String {
        operand
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| operand.to_string())
    };

    let test = match operator.as_str() {
        "equals" => FieldTest::Equals(operand.clone()),
        "notEquals" => FieldTest::NotEquals(operand.clone()),
        "in" => FieldTest::In(list(operand)?),
        "notIn" => FieldTest::NotIn(list(operand)?),
        "like" => FieldTest::Like(text(operand)),
        "notLike" => return Ok(Condition::negate(Condition::field(&path, FieldTest::Like(text(operand))))),
        "contains" => FieldTest::Like(format!("*{}*", text(operand))),
        "notContains" => {
            return Ok(Condition::negate(Condition::field(
                &path,
                FieldTest::Like(format!("*{}*", text(operand))),
            )));
        }
        "exists" => FieldTest::Exists(match operand {
            Value::Bool(flag) => *flag,
            other => text(other).eq_ignore_ascii_case("true"),
        }),
        "greaterOrEquals" => FieldTest::GreaterOrEquals(number(operand)?),
        "lessOrEquals" => FieldTest::LessOrEquals(number(operand)?),
        other => {
            return Err(ComplianceError::InvalidPolicy(format!(
                "unsupported operator '{other}' on '{field}'"
            )));
        }
    };
    Ok(Condition::field(&path, test))
}

fn convert_list(items: &Value) -> ComplianceResult<Vec<Condition>> {
    items
        .as_array()
        .ok_or_else(|| ComplianceError::InvalidPolicy("allOf/anyOf expects an array".to_string()))?
        .iter()
        .map(convert_condition)
        .collect()
}

/// `then.details.operations` of Modify effects as proposed property changes.
fn modify_operations(then: &Value) -> BTreeMap<String, Value> {
    then.get("details")
        .and_then(|details| details.get("operations"))
        .and_then(Value::as_array)
        .map(|operations| {
            operations
                .iter()
                .filter(|operation| {
                    operation
                        .get("operation")
                        .and_then(Value::as_str)
                        .is_some_and(|op| !op.eq_ignore_ascii_case("remove"))
                })
                .filter_map(|operation| {
                    let field = operation.get("field")?.as_str()?;
                    let value = operation.get("value")?.clone();
                    Some((field_path(field), value))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_architecture::{CanonicalResourceType, ResourceNode};
    use serde_json::json;

    fn key_vault_policy() -> Value {
        json!({
            "displayName": "Key Vaults should disable public network access",
            "description": "Org baseline",
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
        })
    }

    #[test]
    fn test_parse_definition_maps_fields() {
        let rule = parse_definition("org", 1, &key_vault_policy()).unwrap();

        assert_eq!(rule.id, "CUSTOM-org-1");
        assert_eq!(rule.name, "Key Vaults should disable public network access");
        assert_eq!(rule.category, RuleCategory::Security);
        assert_eq!(rule.severity, Severity::Critical);
        assert!(rule.enabled);
        assert_eq!(
            rule.origin,
            RuleOrigin::Custom {
                file: "org.json".to_string()
            }
        );
    }

    #[test]
    fn test_check_is_negated_violation() {
        let rule = parse_definition("org", 1, &key_vault_policy()).unwrap();
        let RuleCheck::Resource { condition, .. } = &rule.check else {
            panic!("expected a resource check");
        };

        let open = ResourceNode::new("kv", CanonicalResourceType::KeyVault)
            .with_property("publicNetworkAccess", json!("Enabled"));
        let closed = ResourceNode::new("kv", CanonicalResourceType::KeyVault)
            .with_property("publicNetworkAccess", json!("Disabled"));
        let storage = ResourceNode::new("st", CanonicalResourceType::StorageAccount);

        assert!(!condition.evaluate(&open).unwrap());
        assert!(condition.evaluate(&closed).unwrap());
        assert!(condition.evaluate(&storage).unwrap());
    }

    #[test]
    fn test_effect_mapping() {
        assert_eq!(effect_severity("Deny"), (Severity::Critical, true));
        assert_eq!(effect_severity("DeployIfNotExists"), (Severity::Violation, true));
        assert_eq!(effect_severity("modify"), (Severity::Warning, true));
        assert_eq!(effect_severity("AuditIfNotExists"), (Severity::Warning, true));
        assert_eq!(effect_severity("Disabled"), (Severity::Info, false));
    }

    #[test]
    fn test_modify_operations_become_auto_fix() {
        let policy = json!({
            "displayName": "Require TLS 1.2",
            "policyRule": {
                "if": { "field": "Microsoft.Storage/storageAccounts/minimumTlsVersion", "notEquals": "TLS1_2" },
                "then": {
                    "effect": "Modify",
                    "details": {
                        "operations": [
                            { "operation": "addOrReplace", "field": "Microsoft.Storage/storageAccounts/minimumTlsVersion", "value": "TLS1_2" },
                            { "operation": "Remove", "field": "tags['legacy']" }
                        ]
                    }
                }
            }
        });

        let rule = parse_definition("tls", 2, &policy).unwrap();
        assert_eq!(rule.auto_fix.len(), 1);
        assert_eq!(rule.auto_fix.get("minimumTlsVersion"), Some(&json!("TLS1_2")));
        assert_eq!(rule.severity, Severity::Warning);
    }

    #[test]
    fn test_field_path_forms() {
        assert_eq!(field_path("type"), "type");
        assert_eq!(
            field_path("Microsoft.KeyVault/vaults/networkAcls.defaultAction"),
            "networkAcls.defaultAction"
        );
        assert_eq!(
            field_path("Microsoft.Network/networkSecurityGroups/securityRules[*].access"),
            "securityRules[*].access"
        );
        assert_eq!(field_path("tags['costCenter']"), "tags.costCenter");
    }

    #[test]
    fn test_unsupported_operator_is_rejected() {
        let policy = json!({
            "policyRule": {
                "if": { "field": "location", "matchInsensitively": "east*" },
                "then": { "effect": "Audit" }
            }
        });
        let err = parse_definition("geo", 1, &policy).unwrap_err();
        assert!(err.to_string().contains("matchInsensitively"));
    }

    #[test]
    fn test_document_skips_bad_definitions() {
        let document = json!([
            key_vault_policy(),
            { "displayName": "broken" },
        ]);
        let rules = parse_policy_document("mixed", &document.to_string()).unwrap();

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "CUSTOM-mixed-1");
    }

    #[test]
    fn test_non_json_document_is_an_error() {
        assert!(parse_policy_document("bad", "not json").is_err());
        assert!(parse_policy_document("bad", "42").is_err());
    }
}

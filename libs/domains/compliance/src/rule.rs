use crate::condition::Condition;
use crate::models::{RuleCategory, Severity};
use domain_architecture::CanonicalResourceType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// What a rule inspects and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCheck {
    /// Per-resource condition that must hold. An empty type list applies to every resource.
    Resource {
        applies_to: Vec<CanonicalResourceType>,
        condition: Condition,
    },
    /// Whole-graph check: if any resource of `when_any_of` exists, at least
    /// one of `requires_any_of` must exist too.
    RequiresCompanion {
        when_any_of: Vec<CanonicalResourceType>,
        requires_any_of: Vec<CanonicalResourceType>,
    },
}

/// Where a rule came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RuleOrigin {
    Builtin,
    Custom { file: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: RuleCategory,
    pub check: RuleCheck,
    pub severity: Severity,
    /// Handlebars template
    pub message_template: String,
    /// Handlebars template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation_template: Option<String>,
    /// Proposed property changes; string values are Handlebars templates
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub auto_fix: BTreeMap<String, Value>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub origin: RuleOrigin,
}

fn enabled_by_default() -> bool {
    true
}

impl PolicyRule {
    /// Built-in per-resource rule with a default message.
    pub fn resource(
        id: &str,
        name: &str,
        category: RuleCategory,
        severity: Severity,
        applies_to: &[CanonicalResourceType],
        condition: Condition,
    ) -> Self {
        Self::builtin(
            id,
            name,
            category,
            severity,
            RuleCheck::Resource {
                applies_to: applies_to.to_vec(),
                condition,
            },
            "{{rule_name}} is not satisfied by '{{resource_name}}'",
        )
    }

    /// Built-in graph rule with a default message.
    pub fn companion(
        id: &str,
        name: &str,
        category: RuleCategory,
        severity: Severity,
        when_any_of: &[CanonicalResourceType],
        requires_any_of: &[CanonicalResourceType],
    ) -> Self {
        Self::builtin(
            id,
            name,
            category,
            severity,
            RuleCheck::RequiresCompanion {
                when_any_of: when_any_of.to_vec(),
                requires_any_of: requires_any_of.to_vec(),
            },
            "{{rule_name}}: missing for {{affected_resources}}",
        )
    }

    fn builtin(
        id: &str,
        name: &str,
        category: RuleCategory,
        severity: Severity,
        check: RuleCheck,
        message_template: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            category,
            check,
            severity,
            message_template: message_template.to_string(),
            remediation_template: None,
            auto_fix: BTreeMap::new(),
            enabled: true,
            origin: RuleOrigin::Builtin,
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn message(mut self, template: &str) -> Self {
        self.message_template = template.to_string();
        self
    }

    pub fn remediation(mut self, template: &str) -> Self {
        self.remediation_template = Some(template.to_string());
        self
    }

    pub fn fix(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.auto_fix.insert(path.to_string(), value.into());
        self
    }

    pub fn is_graph_rule(&self) -> bool {
        matches!(self.check, RuleCheck::RequiresCompanion { .. })
    }

    pub fn auto_fixable(&self) -> bool {
        !self.auto_fix.is_empty()
    }

    /// Whether a per-resource rule inspects this type. Graph rules never do.
    pub fn applies_to(&self, resource_type: CanonicalResourceType) -> bool {
        match &self.check {
            RuleCheck::Resource { applies_to, .. } => {
                applies_to.is_empty() || applies_to.contains(&resource_type)
            }
            RuleCheck::RequiresCompanion { .. } => false,
        }
    }

    /// Short scope label: `all`, `graph`, or the comma-separated type list.
    pub fn scope_label(&self) -> String {
        match &self.check {
            RuleCheck::Resource { applies_to, .. } if applies_to.is_empty() => "all".to_string(),
            RuleCheck::Resource { applies_to, .. } => applies_to
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
            RuleCheck::RequiresCompanion { .. } => "graph".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CanonicalResourceType as T;

    #[test]
    fn test_applies_to_empty_list_means_every_type() {
        let rule = PolicyRule::resource(
            "R-1",
            "Tags",
            RuleCategory::Governance,
            Severity::Info,
            &[],
            Condition::exists("tags"),
        );
        assert!(rule.applies_to(T::KeyVault));
        assert!(rule.applies_to(T::Unknown));
        assert_eq!(rule.scope_label(), "all");
    }

    #[test]
    fn test_graph_rules_never_apply_per_resource() {
        let rule = PolicyRule::companion(
            "R-2",
            "Monitoring",
            RuleCategory::Monitoring,
            Severity::Warning,
            &[T::AppService],
            &[T::ApplicationInsights],
        );
        assert!(rule.is_graph_rule());
        assert!(!rule.applies_to(T::AppService));
        assert_eq!(rule.scope_label(), "graph");
    }

    #[test]
    fn test_fix_marks_rule_auto_fixable() {
        let rule = PolicyRule::resource(
            "R-3",
            "HTTPS",
            RuleCategory::Security,
            Severity::Violation,
            &[T::AppService],
            Condition::equals("httpsOnly", true),
        );
        assert!(!rule.auto_fixable());
        assert!(rule.fix("httpsOnly", true).auto_fixable());
    }
}

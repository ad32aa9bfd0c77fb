use core_config::Environment;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Finding severity, ordered from least to most severe.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    Info,
    Warning,
    Violation,
    Critical,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RuleCategory {
    Security,
    Networking,
    Governance,
    Availability,
    Monitoring,
    #[default]
    General,
}

impl RuleCategory {
    /// Maps Azure Policy `metadata.category` values; anything unrecognized is general.
    pub fn from_policy_category(category: &str) -> Self {
        let lower = category.to_ascii_lowercase();
        match lower.as_str() {
            "security" | "security center" | "key vault" | "identity" | "storage" | "sql" => {
                RuleCategory::Security
            }
            "network" | "networking" => RuleCategory::Networking,
            "general" => RuleCategory::General,
            "tags" | "governance" | "regulatory compliance" | "cost" => RuleCategory::Governance,
            "backup" | "availability" | "resilience" => RuleCategory::Availability,
            "monitoring" => RuleCategory::Monitoring,
            _ => RuleCategory::General,
        }
    }
}

/// One rule's result against one resource or the whole graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyFinding {
    pub rule_id: String,
    /// Absent for graph-level findings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    pub severity: Severity,
    pub category: RuleCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
    pub auto_fixable: bool,
}

/// Advisory property changes for one auto-fixable finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationAction {
    pub rule_id: String,
    pub resource_id: String,
    /// Dotted property path → proposed value
    pub proposed_property_changes: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub findings: Vec<PolicyFinding>,
    pub environment: Environment,
    /// Minimum severity surfaced in this environment
    pub enforcement_level: Severity,
    /// Every severity is present, zero when nothing was found
    pub summary_counts: BTreeMap<Severity, usize>,
    pub remediation_actions: Vec<RemediationAction>,
    /// No surfaced finding at violation or above
    pub compliant: bool,
    pub rules_evaluated: usize,
    /// Findings below the enforcement level
    pub suppressed_findings: usize,
    /// Checks that could not run; each also appears as an info finding
    #[serde(default)]
    pub rule_errors: usize,
    pub catalog_version: String,
}

impl ComplianceReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.summary_counts.get(&severity).copied().unwrap_or(0)
    }

    pub fn findings_for<'a>(&'a self, rule_id: &'a str) -> impl Iterator<Item = &'a PolicyFinding> {
        self.findings
            .iter()
            .filter(move |finding| finding.rule_id == rule_id)
    }
}

/// Zeroed counts for every severity, then tallied from `findings`.
pub fn summarize(findings: &[PolicyFinding]) -> BTreeMap<Severity, usize> {
    let mut counts: BTreeMap<Severity, usize> = Severity::iter().map(|s| (s, 0)).collect();
    for finding in findings {
        *counts.entry(finding.severity).or_default() += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Violation);
        assert!(Severity::Violation < Severity::Critical);
    }

    #[test]
    fn test_severity_parse_and_display() {
        assert_eq!(Severity::from_str("CRITICAL").unwrap(), Severity::Critical);
        assert_eq!(Severity::Violation.to_string(), "violation");
        assert_eq!(
            serde_json::to_value(Severity::Warning).unwrap(),
            serde_json::json!("warning")
        );
    }

    #[test]
    fn test_policy_category_mapping() {
        assert_eq!(RuleCategory::from_policy_category("Key Vault"), RuleCategory::Security);
        assert_eq!(RuleCategory::from_policy_category("Network"), RuleCategory::Networking);
        assert_eq!(RuleCategory::from_policy_category("Tags"), RuleCategory::Governance);
        assert_eq!(RuleCategory::from_policy_category("Compute"), RuleCategory::General);
    }

    #[test]
    fn test_summarize_includes_every_severity() {
        let counts = summarize(&[]);
        assert_eq!(counts.len(), 4);
        assert!(counts.values().all(|count| *count == 0));
    }
}

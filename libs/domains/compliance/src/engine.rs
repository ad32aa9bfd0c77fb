//! Policy Compliance Engine.

use crate::catalog::RuleCatalog;
use crate::enforcement::EnforcementTable;
use crate::error::{ComplianceError, ComplianceResult};
use crate::models::{summarize, ComplianceReport, PolicyFinding, RemediationAction, Severity};
use crate::rule::{PolicyRule, RuleCheck};
use crate::templates::{TemplateContext, TemplateRenderer};
use core_config::Environment;
use domain_architecture::{CanonicalResourceType, ResourceNode};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A finding before enforcement is applied.
struct Candidate {
    finding: PolicyFinding,
    /// Evaluation failures bypass enforcement
    always_surface: bool,
    remediation: Option<RemediationAction>,
}

/// Evaluates the rule catalog against normalized resources.
#[derive(Debug, Clone)]
pub struct ComplianceEngine {
    catalog: Arc<RuleCatalog>,
    enforcement: Arc<EnforcementTable>,
    templates: TemplateRenderer,
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new(
            Arc::new(RuleCatalog::builtin()),
            Arc::new(EnforcementTable::default()),
        )
    }
}

impl ComplianceEngine {
    pub fn new(catalog: Arc<RuleCatalog>, enforcement: Arc<EnforcementTable>) -> Self {
        Self {
            catalog,
            enforcement,
            templates: TemplateRenderer::new(),
        }
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Evaluate every enabled rule. Fails only when the enforcement table
    /// has no level for `environment`.
    #[instrument(skip(self, resources), fields(resources = resources.len(), %environment))]
    pub fn evaluate(
        &self,
        resources: &[ResourceNode],
        environment: Environment,
    ) -> ComplianceResult<ComplianceReport> {
        let enforcement_level = self.enforcement.level(environment)?;

        let mut candidates = Vec::new();
        let mut rules_evaluated = 0;
        for rule in self.catalog.enabled_rules() {
            rules_evaluated += 1;
            match &rule.check {
                RuleCheck::Resource { .. } => {
                    for node in resources.iter().filter(|node| rule.applies_to(node.canonical_type)) {
                        if let Some(candidate) = self.check_resource(rule, node, environment) {
                            candidates.push(candidate);
                        }
                    }
                }
                RuleCheck::RequiresCompanion {
                    when_any_of,
                    requires_any_of,
                } => {
                    if let Some(candidate) =
                        self.check_companion(rule, resources, when_any_of, requires_any_of, environment)
                    {
                        candidates.push(candidate);
                    }
                }
            }
        }

        let mut findings = Vec::new();
        let mut remediation_actions = Vec::new();
        let mut suppressed_findings = 0;
        let mut rule_errors = 0;
        for candidate in candidates {
            if candidate.always_surface {
                rule_errors += 1;
            }
            if candidate.always_surface || candidate.finding.severity >= enforcement_level {
                debug!(
                    rule_id = %candidate.finding.rule_id,
                    resource_id = ?candidate.finding.resource_id,
                    severity = %candidate.finding.severity,
                    "Finding"
                );
                remediation_actions.extend(candidate.remediation);
                findings.push(candidate.finding);
            } else {
                suppressed_findings += 1;
            }
        }

        let summary_counts = summarize(&findings);
        let compliant = !findings
            .iter()
            .any(|finding| finding.severity >= Severity::Violation);

        info!(
            findings = findings.len(),
            suppressed = suppressed_findings,
            rules = rules_evaluated,
            compliant,
            "Compliance evaluation complete"
        );

        Ok(ComplianceReport {
            findings,
            environment,
            enforcement_level,
            summary_counts,
            remediation_actions,
            compliant,
            rules_evaluated,
            suppressed_findings,
            rule_errors,
            catalog_version: self.catalog.version().to_string(),
        })
    }

    fn check_resource(
        &self,
        rule: &PolicyRule,
        node: &ResourceNode,
        environment: Environment,
    ) -> Option<Candidate> {
        let RuleCheck::Resource { condition, .. } = &rule.check else {
            return None;
        };
        let context = TemplateContext {
            resource_id: node.id.clone(),
            resource_name: node.name.clone(),
            resource_type: node.canonical_type.to_string(),
            environment: environment.to_string(),
            rule_name: rule.name.clone(),
            affected_resources: node.name.clone(),
        };

        let outcome = condition
            .evaluate(node)
            .map_err(|reason| ComplianceError::RuleEvaluation {
                rule_id: rule.id.clone(),
                reason,
            })
            .and_then(|passed| {
                if passed {
                    Ok(None)
                } else {
                    self.failure(rule, Some(node), &context).map(Some)
                }
            });

        match outcome {
            Ok(candidate) => candidate,
            Err(err) => Some(self.evaluation_error(rule, Some(&node.id), err)),
        }
    }

    fn check_companion(
        &self,
        rule: &PolicyRule,
        resources: &[ResourceNode],
        when_any_of: &[CanonicalResourceType],
        requires_any_of: &[CanonicalResourceType],
        environment: Environment,
    ) -> Option<Candidate> {
        let affected: Vec<&str> = resources
            .iter()
            .filter(|node| when_any_of.contains(&node.canonical_type))
            .map(|node| node.name.as_str())
            .collect();
        let satisfied = resources
            .iter()
            .any(|node| requires_any_of.contains(&node.canonical_type));
        if affected.is_empty() || satisfied {
            return None;
        }

        let context = TemplateContext {
            environment: environment.to_string(),
            rule_name: rule.name.clone(),
            resource_type: "graph".to_string(),
            affected_resources: affected.join(", "),
            ..TemplateContext::default()
        };
        match self.failure(rule, None, &context) {
            Ok(candidate) => Some(candidate),
            Err(err) => Some(self.evaluation_error(rule, None, err)),
        }
    }

    fn failure(
        &self,
        rule: &PolicyRule,
        node: Option<&ResourceNode>,
        context: &TemplateContext,
    ) -> ComplianceResult<Candidate> {
        let message = self.templates.render(&rule.message_template, context)?;
        let remediation = rule
            .remediation_template
            .as_deref()
            .map(|template| self.templates.render(template, context))
            .transpose()?;

        let remediation_action = match node {
            Some(node) if rule.auto_fixable() => {
                let mut changes = BTreeMap::new();
                for (path, value) in &rule.auto_fix {
                    changes.insert(path.clone(), self.templates.render_value(value, context)?);
                }
                Some(RemediationAction {
                    rule_id: rule.id.clone(),
                    resource_id: node.id.clone(),
                    proposed_property_changes: changes,
                })
            }
            _ => None,
        };

        Ok(Candidate {
            finding: PolicyFinding {
                rule_id: rule.id.clone(),
                resource_id: node.map(|node| node.id.clone()),
                severity: rule.severity,
                category: rule.category,
                message,
                remediation,
                auto_fixable: remediation_action.is_some(),
            },
            always_surface: false,
            remediation: remediation_action,
        })
    }

    fn evaluation_error(
        &self,
        rule: &PolicyRule,
        resource_id: Option<&str>,
        err: ComplianceError,
    ) -> Candidate {
        warn!(rule_id = %rule.id, resource_id = ?resource_id, error = %err, "Rule could not run");
        let target = resource_id
            .map(|id| format!(" against '{id}'"))
            .unwrap_or_default();
        Candidate {
            finding: PolicyFinding {
                rule_id: rule.id.clone(),
                resource_id: resource_id.map(str::to_string),
                severity: Severity::Info,
                category: rule.category,
                message: format!("Check '{}' could not run{target}: {err}", rule.name),
                remediation: Some(format!("Fix the definition of rule {}", rule.id)),
                auto_fixable: false,
            },
            always_surface: true,
            remediation: None,
        }
    }
}

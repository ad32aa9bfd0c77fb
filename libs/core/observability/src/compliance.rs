//! Compliance evaluation metrics.

use metrics::{counter, gauge};

/// Compliance engine metrics recorder
pub struct ComplianceMetrics;

impl ComplianceMetrics {
    /// Record a completed evaluation.
    ///
    /// `surfaced_by_severity` holds one `(severity, count)` pair per level.
    pub fn record_evaluation(
        environment: &str,
        surfaced_by_severity: &[(&str, usize)],
        suppressed: usize,
        rule_errors: usize,
    ) {
        counter!("compliance_evaluations_total", "environment" => environment.to_string())
            .increment(1);

        for (severity, count) in surfaced_by_severity {
            counter!("compliance_findings_total", "severity" => severity.to_string())
                .increment(*count as u64);
        }

        counter!("compliance_findings_suppressed_total").increment(suppressed as u64);
        counter!("compliance_rule_errors_total").increment(rule_errors as u64);

        if rule_errors > 0 {
            tracing::warn!(
                environment = environment,
                rule_errors = rule_errors,
                "Some rule checks could not run"
            );
        }
    }

    /// Set the number of rules in the effective catalog
    pub fn set_rules_loaded(origin: &str, count: usize) {
        gauge!("compliance_rules_loaded", "origin" => origin.to_string()).set(count as f64);
    }
}

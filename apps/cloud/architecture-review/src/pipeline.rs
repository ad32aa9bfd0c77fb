//! Review Pipeline
//!
//! Normalizes a graph once, then runs cost estimation and compliance
//! evaluation side by side on the blocking pool.

use chrono::{DateTime, Utc};
use core_config::Environment;
use domain_architecture::{normalize, ArchitectureGraph, NormalizationWarning, ResourceNode};
use domain_compliance::{ComplianceEngine, ComplianceReport};
use domain_pricing::{CostEstimator, CostReport};
use eyre::Result;
use observability::{AnalysisTimer, ComplianceMetrics, CostMetrics};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Which engines a run includes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stages {
    Both,
    CostOnly,
    ComplianceOnly,
}

impl Stages {
    fn cost(self) -> bool {
        matches!(self, Stages::Both | Stages::CostOnly)
    }

    fn compliance(self) -> bool {
        matches!(self, Stages::Both | Stages::ComplianceOnly)
    }
}

/// Per-run settings resolved from flags and configuration
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub environment: Environment,
    /// Explicit `--region`; wins over the graph's hint
    pub region: Option<String>,
    pub default_region: String,
    pub generated_at: DateTime<Utc>,
    pub stages: Stages,
}

/// Combined output printed by the CLI
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutput {
    pub environment: Environment,
    pub region: String,
    pub normalization_warnings: Vec<NormalizationWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance: Option<ComplianceReport>,
}

/// Flag first, then the graph's region hint, then configuration.
pub fn resolve_region(flag: Option<&str>, hint: Option<&str>, fallback: &str) -> String {
    flag.or(hint)
        .map(str::trim)
        .filter(|region| !region.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

pub struct ReviewPipeline {
    estimator: Arc<CostEstimator>,
    compliance: Arc<ComplianceEngine>,
}

impl ReviewPipeline {
    pub fn new(estimator: Arc<CostEstimator>, compliance: Arc<ComplianceEngine>) -> Self {
        Self {
            estimator,
            compliance,
        }
    }

    #[instrument(skip_all, fields(environment = %request.environment, stages = ?request.stages))]
    pub async fn run(&self, graph: &ArchitectureGraph, request: &ReviewRequest) -> Result<ReviewOutput> {
        let mut timer = AnalysisTimer::start("normalize");
        let normalized = normalize(graph);
        timer.stop();

        let mut warnings_by_kind: BTreeMap<String, usize> = BTreeMap::new();
        for warning in &normalized.warnings {
            *warnings_by_kind.entry(warning.kind.to_string()).or_default() += 1;
        }
        let warnings_by_kind: Vec<(&str, usize)> = warnings_by_kind
            .iter()
            .map(|(kind, count)| (kind.as_str(), *count))
            .collect();
        CostMetrics::record_normalization(normalized.resources.len(), &warnings_by_kind);

        let region = resolve_region(
            request.region.as_deref(),
            normalized.region_hint.as_deref(),
            &request.default_region,
        );
        let resources = Arc::new(normalized.resources);

        let (cost, compliance) = tokio::try_join!(
            async {
                if request.stages.cost() {
                    self.estimate(Arc::clone(&resources), request, region.clone())
                        .await
                        .map(Some)
                } else {
                    Ok(None)
                }
            },
            async {
                if request.stages.compliance() {
                    self.evaluate(Arc::clone(&resources), request.environment)
                        .await
                        .map(Some)
                } else {
                    Ok(None)
                }
            },
        )?;

        info!(
            resources = resources.len(),
            warnings = normalized.warnings.len(),
            region = %region,
            "Review complete"
        );

        Ok(ReviewOutput {
            environment: request.environment,
            region,
            normalization_warnings: normalized.warnings,
            cost,
            compliance,
        })
    }

    async fn estimate(
        &self,
        resources: Arc<Vec<ResourceNode>>,
        request: &ReviewRequest,
        region: String,
    ) -> Result<CostReport> {
        let estimator = Arc::clone(&self.estimator);
        let environment = request.environment;
        let generated_at = request.generated_at;

        let report = tokio::task::spawn_blocking(move || {
            let _timer = AnalysisTimer::start("estimate");
            estimator.estimate(&resources, environment, &region, generated_at)
        })
        .await??;

        let unpriced = report.line_items.iter().filter(|line| !line.is_priced()).count();
        CostMetrics::record_estimate(
            environment.as_str(),
            report.line_items.len() - unpriced,
            unpriced,
            report.total_monthly.to_decimal(),
        );
        Ok(report)
    }

    async fn evaluate(
        &self,
        resources: Arc<Vec<ResourceNode>>,
        environment: Environment,
    ) -> Result<ComplianceReport> {
        let engine = Arc::clone(&self.compliance);

        let report = tokio::task::spawn_blocking(move || {
            let _timer = AnalysisTimer::start("evaluate");
            engine.evaluate(&resources, environment)
        })
        .await??;

        let by_severity: Vec<(String, usize)> = report
            .summary_counts
            .iter()
            .map(|(severity, count)| (severity.to_string(), *count))
            .collect();
        let by_severity: Vec<(&str, usize)> = by_severity
            .iter()
            .map(|(severity, count)| (severity.as_str(), *count))
            .collect();
        ComplianceMetrics::record_evaluation(
            environment.as_str(),
            &by_severity,
            report.suppressed_findings,
            report.rule_errors,
        );
        Ok(report)
    }
}

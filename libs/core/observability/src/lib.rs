//! Observability utilities for the architecture review engines.
//!
//! This crate provides:
//! - Prometheus metrics recording and text exposition
//! - Metric recorders for cost estimation and compliance evaluation
//! - A drop-guard timer for analysis durations
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, render_metrics, CostMetrics};
//!
//! init_metrics();
//! CostMetrics::record_estimate("production", 4, 0, 176.08);
//! println!("{}", render_metrics());
//! ```

pub mod compliance;
pub mod estimation;
pub mod timer;

pub use compliance::ComplianceMetrics;
pub use estimation::CostMetrics;
pub use timer::AnalysisTimer;

pub use metrics::{counter, gauge, histogram};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize the Prometheus metrics recorder.
///
/// Call once at startup; later calls return the same handle. If another
/// global recorder is already installed, a detached handle is returned and
/// nothing recorded through the `metrics` macros will show up in it.
pub fn init_metrics() -> &'static PrometheusHandle {
    METRICS_HANDLE.get_or_init(|| {
        let handle = match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("Prometheus metrics recorder initialized");
                handle
            }
            Err(error) => {
                warn!(%error, "Global metrics recorder unavailable, using detached handle");
                PrometheusBuilder::new().build_recorder().handle()
            }
        };

        register_metric_descriptions();

        handle
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Prometheus text exposition of everything recorded so far.
pub fn render_metrics() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    // Normalization
    describe_counter!(
        "normalization_warnings_total",
        "Normalization warnings by kind"
    );
    describe_gauge!(
        "normalized_resources_last_run",
        "Billable resources kept by the last normalization"
    );

    // Cost estimation
    describe_counter!(
        "cost_estimates_total",
        "Cost estimates produced by environment"
    );
    describe_counter!(
        "cost_line_items_total",
        "Cost line items by status"
    );
    describe_gauge!(
        "cost_monthly_total_usd",
        "Monthly total of the last estimate by environment"
    );

    // Compliance
    describe_counter!(
        "compliance_evaluations_total",
        "Compliance evaluations by environment"
    );
    describe_counter!(
        "compliance_findings_total",
        "Surfaced findings by severity"
    );
    describe_counter!(
        "compliance_findings_suppressed_total",
        "Findings below the enforcement level"
    );
    describe_counter!(
        "compliance_rule_errors_total",
        "Rule checks that could not run"
    );
    describe_gauge!(
        "compliance_rules_loaded",
        "Rules in the effective catalog by origin"
    );

    // Durations
    describe_histogram!(
        "analysis_duration_seconds",
        "Engine run duration in seconds by stage"
    );
}

//! Cost estimation and normalization metrics.

use metrics::{counter, gauge};

/// Cost engine metrics recorder
pub struct CostMetrics;

impl CostMetrics {
    /// Record a completed estimate
    pub fn record_estimate(
        environment: &str,
        priced_lines: usize,
        unpriced_lines: usize,
        total_monthly_usd: f64,
    ) {
        counter!("cost_estimates_total", "environment" => environment.to_string()).increment(1);
        counter!("cost_line_items_total", "status" => "priced").increment(priced_lines as u64);
        counter!("cost_line_items_total", "status" => "unpriced")
            .increment(unpriced_lines as u64);
        gauge!("cost_monthly_total_usd", "environment" => environment.to_string())
            .set(total_monthly_usd);

        tracing::debug!(
            environment = environment,
            priced_lines = priced_lines,
            unpriced_lines = unpriced_lines,
            total_monthly_usd = total_monthly_usd,
            "Recorded cost estimate"
        );
    }

    /// Record the outcome of normalizing one graph
    pub fn record_normalization(resources: usize, warnings_by_kind: &[(&str, usize)]) {
        gauge!("normalized_resources_last_run").set(resources as f64);
        for (kind, count) in warnings_by_kind {
            counter!("normalization_warnings_total", "kind" => kind.to_string())
                .increment(*count as u64);
        }
    }
}

//! Threshold-derived cost optimization hints.

use crate::catalog::PricingCatalog;
use crate::models::{CostCategory, CostLineItem, Currency, Money, Recommendation, RecommendationKind};
use core_config::Environment;
use domain_architecture::CanonicalResourceType;
use serde::{Deserialize, Serialize};

/// Thresholds in USD per month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationThresholds {
    /// Total above which reserved capacity is suggested
    pub reserved_capacity_monthly: f64,
    /// Single line above which right-sizing is suggested
    pub right_size_monthly: f64,
    /// Networking lines above which consolidation is suggested
    pub network_consolidation_count: usize,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            reserved_capacity_monthly: 1000.0,
            right_size_monthly: 500.0,
            network_consolidation_count: 3,
        }
    }
}

/// Per-line pricing context the report itself does not carry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineContext {
    pub sku_defaulted: bool,
    pub environment_multiplier: f64,
    pub region_multiplier: f64,
}

pub(crate) struct RecommendationInput<'a> {
    pub catalog: &'a PricingCatalog,
    pub environment: Environment,
    pub lines: &'a [(CostLineItem, LineContext)],
    pub total_monthly: Money,
    pub thresholds: RecommendationThresholds,
}

/// Hints in a fixed order so identical inputs give identical reports.
pub(crate) fn recommend(input: &RecommendationInput<'_>) -> Vec<Recommendation> {
    let mut out = Vec::new();
    let priced = || input.lines.iter().filter(|(line, _)| line.is_priced());

    let total = input.total_monthly.to_decimal();
    if total > input.thresholds.reserved_capacity_monthly {
        out.push(hint(
            RecommendationKind::ReservedCapacity,
            None,
            format!(
                "Monthly total ${total:.2} exceeds ${:.2}; consider Azure Reserved Instances or savings plans for steady workloads (up to 72% off)",
                input.thresholds.reserved_capacity_monthly
            ),
            None,
        ));
    }

    if input.environment.is_development() {
        out.push(hint(
            RecommendationKind::DevTestPricing,
            None,
            "Use Azure Dev/Test pricing for development subscriptions".to_string(),
            None,
        ));

        let full_size_vms = priced().any(|(line, _)| {
            line.canonical_type == CanonicalResourceType::VirtualMachine
                && !line
                    .sku
                    .as_deref()
                    .is_some_and(|sku| sku.to_ascii_lowercase().starts_with("standard_b"))
        });
        if full_size_vms {
            out.push(hint(
                RecommendationKind::BSeriesCompute,
                None,
                "Consider burstable B-series VMs for development workloads".to_string(),
                None,
            ));
        }
    }

    if !input.environment.is_production() {
        for (line, context) in priced() {
            if line.canonical_type != CanonicalResourceType::SqlDatabase || context.sku_defaulted {
                continue;
            }
            if let Some((recommended, savings)) = downgrade(input, line, context) {
                out.push(hint(
                    RecommendationKind::SqlTierAboveWorkload,
                    Some(&line.resource_id),
                    format!(
                        "SQL database '{}' runs tier {} in {}; {recommended} is typical for this workload",
                        line.resource_name,
                        line.sku.as_deref().unwrap_or("unknown"),
                        input.environment
                    ),
                    Some(savings),
                ));
            }
        }
    }

    for (line, context) in priced() {
        if !context.sku_defaulted {
            continue;
        }
        if let Some((recommended, savings)) = downgrade(input, line, context) {
            out.push(hint(
                RecommendationKind::SkuAboveEnvironment,
                Some(&line.resource_id),
                format!(
                    "'{}' was priced at default SKU {}; {recommended} is recommended for {}",
                    line.resource_name,
                    line.sku.as_deref().unwrap_or("unknown"),
                    input.environment
                ),
                Some(savings),
            ));
        }
    }

    for (line, _) in priced() {
        let monthly = line.monthly_cost.to_decimal();
        if monthly > input.thresholds.right_size_monthly {
            out.push(hint(
                RecommendationKind::RightSize,
                Some(&line.resource_id),
                format!(
                    "'{}' costs ${monthly:.2}/month; review utilization and consider right-sizing or an alternative SKU",
                    line.resource_name
                ),
                None,
            ));
        }
    }

    if priced().any(|(line, _)| line.canonical_type == CanonicalResourceType::StorageAccount) {
        out.push(hint(
            RecommendationKind::StorageTiering,
            None,
            "Use Cool or Archive access tiers for infrequently accessed data".to_string(),
            None,
        ));
    }

    let networking = priced()
        .filter(|(line, _)| line.category == CostCategory::Networking)
        .count();
    if networking > input.thresholds.network_consolidation_count {
        out.push(hint(
            RecommendationKind::NetworkConsolidation,
            None,
            format!("{networking} networking resources priced; consolidate where possible"),
            None,
        ));
    }

    out
}

/// Recommended SKU and scaled monthly saving when the line's rate card costs
/// more than the environment's recommended one.
fn downgrade(
    input: &RecommendationInput<'_>,
    line: &CostLineItem,
    context: &LineContext,
) -> Option<(&'static str, Money)> {
    let entry = input.catalog.entry(line.canonical_type)?;
    let current = entry.card(line.sku.as_deref()?)?;
    let recommended = entry.recommended_card(input.environment)?;
    let difference = current.monthly_base - recommended.monthly_base;
    if difference <= 0.0 {
        return None;
    }
    let savings = Money::from_decimal(
        difference * context.environment_multiplier * context.region_multiplier,
        Currency::Usd,
    );
    Some((recommended.sku, savings))
}

fn hint(
    kind: RecommendationKind,
    resource_id: Option<&str>,
    message: String,
    estimated_monthly_savings: Option<Money>,
) -> Recommendation {
    Recommendation {
        kind,
        resource_id: resource_id.map(str::to_string),
        message,
        estimated_monthly_savings,
    }
}

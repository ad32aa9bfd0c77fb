//! Cost Estimation Engine.
//!
//! Prices each normalized resource through the [`PricingCatalog`], applies the
//! environment and region multipliers, rolls lines up by category and derives
//! recommendations. A resource without a pricing model degrades to a warned
//! zero-cost line; only configuration problems fail the whole estimate.

use crate::catalog::{format_quantity, PricingCatalog, MAX_MONTHLY_COST};
use crate::config::MultiplierTable;
use crate::error::{PricingError, PricingResult};
use crate::models::{CostCategory, CostLineItem, CostReport, Currency, LineStatus, Money};
use crate::recommendations::{recommend, LineContext, RecommendationInput, RecommendationThresholds};
use chrono::{DateTime, Utc};
use core_config::Environment;
use domain_architecture::ResourceNode;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const DISCLAIMER: &str = "Cost estimates are approximate and based on standard pricing. \
Actual costs may vary based on usage patterns, discounts, and current Azure pricing.";

/// Stateless estimator over shared, read-only tables.
#[derive(Debug, Clone)]
pub struct CostEstimator {
    catalog: Arc<PricingCatalog>,
    multipliers: Arc<MultiplierTable>,
    thresholds: RecommendationThresholds,
}

impl Default for CostEstimator {
    fn default() -> Self {
        Self::new(
            Arc::new(PricingCatalog::builtin()),
            Arc::new(MultiplierTable::default()),
        )
    }
}

impl CostEstimator {
    pub fn new(catalog: Arc<PricingCatalog>, multipliers: Arc<MultiplierTable>) -> Self {
        Self {
            catalog,
            multipliers,
            thresholds: RecommendationThresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: RecommendationThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn catalog(&self) -> &PricingCatalog {
        &self.catalog
    }

    pub fn multipliers(&self) -> &MultiplierTable {
        &self.multipliers
    }

    /// Estimate monthly and annual cost for `resources`.
    ///
    /// Fails with [`PricingError::InvalidConfiguration`] when the multiplier
    /// table is unusable for `environment`, and with
    /// [`PricingError::TotalOutOfRange`] when totals overflow.
    #[instrument(skip(self, resources), fields(resources = resources.len(), %environment))]
    pub fn estimate(
        &self,
        resources: &[ResourceNode],
        environment: Environment,
        region: &str,
        generated_at: DateTime<Utc>,
    ) -> PricingResult<CostReport> {
        self.multipliers.validate()?;
        let environment_multiplier = self.multipliers.environment_multiplier(environment)?;
        let region_lookup = self.multipliers.region_multiplier(region);
        let region_multiplier = region_lookup.multiplier;

        let mut warnings = Vec::new();
        if let Some(warning) = region_lookup.warning {
            warn!(region, "{}", warning);
            warnings.push(warning);
        }

        let mut lines = Vec::with_capacity(resources.len());
        for node in resources {
            let priced = self.price_line(node, environment_multiplier, region_multiplier)?;
            if let Some(warning) = priced.warning {
                warnings.push(warning);
            }
            lines.push((priced.line, priced.context));
        }

        let mut total_monthly = Money::zero();
        let mut category_totals: BTreeMap<CostCategory, Money> = BTreeMap::new();
        for (line, _) in lines.iter().filter(|(line, _)| line.is_priced()) {
            total_monthly = total_monthly
                .checked_add(line.monthly_cost)
                .ok_or(PricingError::TotalOutOfRange)?;
            let category = category_totals.entry(line.category).or_default();
            *category = category
                .checked_add(line.monthly_cost)
                .ok_or(PricingError::TotalOutOfRange)?;
        }
        category_totals.retain(|_, total| total.amount > 0);
        let total_annual = total_monthly
            .checked_times(12)
            .ok_or(PricingError::TotalOutOfRange)?;

        let recommendations = recommend(&RecommendationInput {
            catalog: &self.catalog,
            environment,
            lines: &lines,
            total_monthly,
            thresholds: self.thresholds,
        });

        info!(
            lines = lines.len(),
            total_monthly = total_monthly.to_decimal(),
            recommendations = recommendations.len(),
            "Cost estimate complete"
        );

        Ok(CostReport {
            line_items: lines.into_iter().map(|(line, _)| line).collect(),
            category_totals,
            total_monthly,
            total_annual,
            currency: Currency::Usd,
            environment,
            region: region_lookup.region,
            environment_multiplier,
            region_multiplier,
            recommendations,
            warnings,
            pricing_version: self.catalog.version().to_string(),
            disclaimer: DISCLAIMER.to_string(),
            generated_at,
        })
    }

    fn price_line(
        &self,
        node: &ResourceNode,
        environment_multiplier: f64,
        region_multiplier: f64,
    ) -> PricingResult<PricedLine> {
        let context = LineContext {
            sku_defaulted: false,
            environment_multiplier,
            region_multiplier,
        };
        let requested_sku = self.catalog.sku_for(node);
        let function = match self.catalog.lookup(node.canonical_type, requested_sku.as_deref()) {
            Ok(function) => function,
            Err(PricingError::PricingUnavailable(resource_type)) => {
                debug!(resource_id = %node.id, %resource_type, "No pricing model");
                return Ok(PricedLine {
                    line: unpriced(
                        node,
                        requested_sku,
                        vec![format!(
                            "No pricing model for type '{resource_type}'; excluded from totals"
                        )],
                    ),
                    context,
                    warning: Some(format!(
                        "Resource '{}' of type '{}' has no pricing model and is excluded from totals",
                        node.id, node.raw_type
                    )),
                });
            }
            Err(err) => return Err(err),
        };

        let context = LineContext {
            sku_defaulted: function.sku_defaulted,
            ..context
        };
        let quote = match function.price(node, environment_multiplier, region_multiplier) {
            Ok(quote) => quote,
            Err(PricingError::CostOutOfRange { monthly, .. }) => {
                warn!(resource_id = %node.id, monthly, "Usage inputs price the resource out of range");
                let mut line = unpriced(
                    node,
                    Some(function.sku().to_string()),
                    vec![format!(
                        "Usage inputs give a monthly cost above {}; excluded from totals",
                        usd_ceiling()
                    )],
                );
                line.category = function.category();
                return Ok(PricedLine {
                    line,
                    context,
                    warning: Some(format!(
                        "Resource '{}' has usage inputs that price it above {} per month and is excluded from totals",
                        node.id,
                        usd_ceiling()
                    )),
                });
            }
            Err(err) => return Err(err),
        };
        debug!(
            resource_id = %node.id,
            sku = function.sku(),
            monthly = quote.monthly_cost.to_decimal(),
            "Priced resource"
        );

        let line = CostLineItem {
            resource_id: node.id.clone(),
            resource_name: node.name.clone(),
            canonical_type: node.canonical_type,
            sku: Some(function.sku().to_string()),
            monthly_cost: quote.monthly_cost,
            annual_cost: quote.monthly_cost.times(12),
            cost_factors: quote.cost_factors,
            assumptions: quote.assumptions,
            category: function.category(),
            status: LineStatus::Priced,
            environment_multiplier: Some(environment_multiplier),
            region_multiplier: Some(region_multiplier),
        };
        Ok(PricedLine {
            line,
            context,
            warning: None,
        })
    }
}

struct PricedLine {
    line: CostLineItem,
    context: LineContext,
    /// Report-level warning for lines excluded from totals
    warning: Option<String>,
}

/// Zero-cost line that totals skip.
fn unpriced(node: &ResourceNode, sku: Option<String>, assumptions: Vec<String>) -> CostLineItem {
    CostLineItem {
        resource_id: node.id.clone(),
        resource_name: node.name.clone(),
        canonical_type: node.canonical_type,
        sku,
        monthly_cost: Money::zero(),
        annual_cost: Money::zero(),
        cost_factors: Vec::new(),
        assumptions,
        category: CostCategory::Other,
        status: LineStatus::Unpriced,
        environment_multiplier: None,
        region_multiplier: None,
    }
}

fn usd_ceiling() -> String {
    format!("${}", format_quantity(MAX_MONTHLY_COST))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_architecture::CanonicalResourceType;
    use test_utils::fixtures;

    #[test]
    fn test_missing_environment_multiplier_is_fatal() {
        let table = MultiplierTable::from_json(r#"{ "environments": { "production": 1.0 } }"#).unwrap();
        let estimator = CostEstimator::new(Arc::new(PricingCatalog::builtin()), Arc::new(table));

        let err = estimator
            .estimate(&[], Environment::Development, "eastus", fixtures::generated_at())
            .unwrap_err();

        assert!(err.is_fatal());
        assert!(err.to_string().contains("development"));
    }

    #[test]
    fn test_unknown_region_warns_and_uses_baseline() {
        let node = ResourceNode::new("kv", CanonicalResourceType::KeyVault);
        let report = CostEstimator::default()
            .estimate(&[node], Environment::Production, "Moon Base", fixtures::generated_at())
            .unwrap();

        assert_eq!(report.region_multiplier, 1.0);
        assert!(report.warnings.iter().any(|w| w.contains("Moon Base")));
    }

    #[test]
    fn test_region_multiplier_applies_to_lines() {
        let node = ResourceNode::new("web", CanonicalResourceType::AppService).with_sku("S1");
        let report = CostEstimator::default()
            .estimate(&[node], Environment::Production, "West Europe", fixtures::generated_at())
            .unwrap();

        assert_eq!(report.region, "westeurope");
        assert_eq!(
            report.total_monthly,
            Money::from_decimal(70.08 * 1.0 * 1.08, Currency::Usd)
        );
    }

    #[test]
    fn test_unpriced_line_is_zero_and_warned() {
        let node = ResourceNode::new("mystery", CanonicalResourceType::Unknown);
        let report = CostEstimator::default()
            .estimate(&[node], Environment::Production, "eastus", fixtures::generated_at())
            .unwrap();

        let line = &report.line_items[0];
        assert_eq!(line.status, LineStatus::Unpriced);
        assert!(line.monthly_cost.is_zero());
        assert!(line.assumptions[0].contains("excluded from totals"));
        assert!(report.category_totals.is_empty());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_out_of_range_usage_is_excluded_not_panicking() {
        let huge = ResourceNode::new("st", CanonicalResourceType::StorageAccount)
            .with_sku("Standard_LRS")
            .with_property("storageGB", serde_json::json!(1e18));
        let web = ResourceNode::new("web", CanonicalResourceType::AppService).with_sku("S1");

        let report = CostEstimator::default()
            .estimate(&[huge, web], Environment::Production, "eastus", fixtures::generated_at())
            .unwrap();

        let line = report.line("st").unwrap();
        assert_eq!(line.status, LineStatus::Unpriced);
        assert!(line.monthly_cost.is_zero());
        assert_eq!(line.category, CostCategory::Storage);
        assert!(line.assumptions[0].contains("$1,000,000,000"));
        assert_eq!(report.total_monthly, Money::from_decimal(70.08, Currency::Usd));
        assert_eq!(report.total_annual, report.total_monthly.times(12));
        assert!(!report.category_totals.contains_key(&CostCategory::Storage));
        assert!(report.warnings.iter().any(|w| w.contains("'st'")));
    }

    #[test]
    fn test_totals_past_the_money_range_are_fatal() {
        let node = ResourceNode::new("st", CanonicalResourceType::StorageAccount)
            .with_sku("Standard_LRS")
            .with_property("storageGB", serde_json::json!(5.4e10));
        let resources = vec![node; 10_000];

        let err = CostEstimator::default()
            .estimate(&resources, Environment::Production, "eastus", fixtures::generated_at())
            .unwrap_err();

        assert!(matches!(err, PricingError::TotalOutOfRange));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_free_resources_do_not_create_categories() {
        let node = ResourceNode::new("vnet", CanonicalResourceType::VirtualNetwork);
        let report = CostEstimator::default()
            .estimate(&[node], Environment::Production, "eastus", fixtures::generated_at())
            .unwrap();

        assert_eq!(report.line_items.len(), 1);
        assert!(report.line_items[0].is_priced());
        assert!(!report.category_totals.contains_key(&CostCategory::Networking));
    }
}

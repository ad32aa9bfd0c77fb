use core_config::Environment;
use domain_architecture::normalize;
use domain_pricing::{CostCategory, CostEstimator, CostReport, LineStatus, Money, RecommendationKind};
use serde_json::json;
use test_utils::assertions::{assert_close, assert_some};
use test_utils::{fixtures, GraphBuilder};

fn estimate(graph: &domain_architecture::ArchitectureGraph, environment: Environment) -> CostReport {
    let normalized = normalize(graph);
    CostEstimator::default()
        .estimate(&normalized.resources, environment, "eastus", fixtures::generated_at())
        .unwrap()
}

#[test]
fn test_web_app_production_categories() {
    let report = estimate(&fixtures::web_app_graph(), Environment::Production);

    assert_eq!(report.line_items.len(), 3);
    assert!(report.category_total(CostCategory::Compute).amount > 0);
    assert!(report.category_total(CostCategory::Database).amount > 0);
    assert!(report.category_total(CostCategory::Storage).amount > 0);
    assert!(!report.category_totals.contains_key(&CostCategory::Networking));

    assert_close(report.category_total(CostCategory::Compute).to_decimal(), 70.08, 1e-6, "app service S1");
    assert_close(report.category_total(CostCategory::Database).to_decimal(), 75.0, 1e-6, "sql S2");
    assert_close(report.category_total(CostCategory::Storage).to_decimal(), 1.88, 1e-6, "storage LRS");
}

#[test]
fn test_totals_match_lines_and_categories() {
    for environment in Environment::ALL {
        let report = estimate(&fixtures::web_app_graph(), environment);

        let lines: Money = report.line_items.iter().map(|line| line.monthly_cost).sum();
        let categories: Money = report.category_totals.values().sum();
        assert_eq!(report.total_monthly, lines);
        assert_eq!(report.total_monthly, categories);
        assert_eq!(report.total_annual, report.total_monthly.times(12));

        for line in &report.line_items {
            assert_eq!(line.annual_cost.amount, line.monthly_cost.amount * 12);
        }
    }
}

#[test]
fn test_invalid_usage_falls_back_to_defaults() {
    let graph = GraphBuilder::new()
        .resource_with(
            "Storage Account",
            "assets",
            Some("Standard_LRS"),
            json!({ "storageGB": -250, "monthlyTransactions": "NaN" }),
        )
        .build();

    let report = estimate(&graph, Environment::Production);

    let line = assert_some(report.line("assets"), "assets");
    assert!(line.is_priced());
    assert!(line.assumptions.iter().any(|a| a == "100 GB stored per month"));
    assert!(line.assumptions.iter().any(|a| a == "1,000,000 transactions per month"));
    assert_close(line.monthly_cost.to_decimal(), 1.88, 1e-6, "defaulted storage");
}

#[test]
fn test_huge_usage_is_excluded_and_totals_hold() {
    let graph = GraphBuilder::new()
        .resource("App Service", "web")
        .resource_with(
            "Storage Account",
            "lake",
            Some("Standard_LRS"),
            json!({ "storageGB": 1e18 }),
        )
        .build();

    let report = estimate(&graph, Environment::Production);

    let lake = assert_some(report.line("lake"), "lake");
    assert_eq!(lake.status, LineStatus::Unpriced);
    assert!(lake.monthly_cost.is_zero());
    assert!(report.warnings.iter().any(|w| w.contains("'lake'")));

    let lines: Money = report.line_items.iter().map(|line| line.monthly_cost).sum();
    let categories: Money = report.category_totals.values().sum();
    assert_eq!(report.total_monthly, lines);
    assert_eq!(report.total_monthly, categories);
    assert_eq!(report.total_annual, report.total_monthly.times(12));
    assert_close(report.total_monthly.to_decimal(), 70.08, 1e-6, "web only");
}

#[test]
fn test_snake_case_size_key_is_priced() {
    let graph = GraphBuilder::new()
        .resource_with(
            "Storage Account",
            "assets",
            Some("Standard_LRS"),
            json!({ "size_gb": 500 }),
        )
        .build();

    let report = estimate(&graph, Environment::Production);

    let line = assert_some(report.line("assets"), "assets");
    assert_close(line.monthly_cost.to_decimal(), 500.0 * 0.0184 + 0.04, 1e-6, "500 GB LRS");
    assert!(!line.assumptions.iter().any(|a| a.contains("GB stored per month")));
}

#[test]
fn test_development_is_half_of_production() {
    let production = estimate(&fixtures::web_app_graph(), Environment::Production);
    let development = estimate(&fixtures::web_app_graph(), Environment::Development);

    for prod_line in &production.line_items {
        let dev_line = assert_some(development.line(&prod_line.resource_id), &prod_line.resource_id);
        assert_close(
            dev_line.monthly_cost.to_decimal(),
            prod_line.monthly_cost.to_decimal() * 0.5,
            1e-6,
            &prod_line.resource_id,
        );
    }
}

#[test]
fn test_monotonic_across_environments() {
    let production = estimate(&fixtures::web_app_graph(), Environment::Production);
    let staging = estimate(&fixtures::web_app_graph(), Environment::Staging);
    let development = estimate(&fixtures::web_app_graph(), Environment::Development);

    assert!(production.total_monthly.amount >= staging.total_monthly.amount);
    assert!(staging.total_monthly.amount >= development.total_monthly.amount);
}

#[test]
fn test_forwarding_edge_yields_two_lines() {
    let report = estimate(&fixtures::forwarding_graph(), Environment::Production);

    let ids: Vec<_> = report.line_items.iter().map(|line| line.resource_id.as_str()).collect();
    assert_eq!(ids, vec!["edge", "web"]);
    assert!(report.line("edge-to-web").is_none());
}

#[test]
fn test_unknown_thing_is_a_zero_warned_line() {
    let baseline = estimate(&fixtures::web_app_graph(), Environment::Production);

    let mut graph = fixtures::web_app_graph();
    graph
        .resources
        .extend(fixtures::unknown_thing_graph().resources);
    let report = estimate(&graph, Environment::Production);

    let line = assert_some(report.line("mystery"), "mystery line");
    assert!(line.monthly_cost.is_zero());
    assert!(line.assumptions.iter().any(|a| a.contains("No pricing model")));
    assert_eq!(report.category_totals, baseline.category_totals);
    assert_eq!(report.total_monthly, baseline.total_monthly);
}

#[test]
fn test_estimate_is_deterministic() {
    let first = estimate(&fixtures::web_app_graph(), Environment::Staging);
    let second = estimate(&fixtures::web_app_graph(), Environment::Staging);

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_development_recommends_smaller_tiers() {
    let report = estimate(&fixtures::web_app_graph(), Environment::Development);

    let kinds: Vec<_> = report.recommendations.iter().map(|r| r.kind).collect();
    assert!(kinds.contains(&RecommendationKind::DevTestPricing));
    assert!(kinds.contains(&RecommendationKind::SqlTierAboveWorkload));
    assert!(kinds.contains(&RecommendationKind::SkuAboveEnvironment));
    assert!(kinds.contains(&RecommendationKind::StorageTiering));
}

#[test]
fn test_report_metadata() {
    let report = estimate(&fixtures::web_app_graph(), Environment::Production);

    assert_eq!(report.environment, Environment::Production);
    assert_eq!(report.region, "eastus");
    assert_eq!(report.environment_multiplier, 1.0);
    assert_eq!(report.generated_at, fixtures::generated_at());
    assert!(!report.pricing_version.is_empty());
    assert!(report.warnings.is_empty());
}

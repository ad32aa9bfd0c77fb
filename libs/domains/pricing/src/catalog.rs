//! Pricing Catalog.
//!
//! A dispatch table from [`CanonicalResourceType`] to a [`CatalogEntry`]: rate
//! cards per SKU, a default SKU, the SKU recommended per environment, a cost
//! category and a pure pricing formula. Rates are USD list prices per month.
//!
//! Usage inputs read from resource properties (defaults in parentheses, each
//! default is recorded as an assumption on the line item):
//!
//! | Type | Properties |
//! |---|---|
//! | virtual machine | `hardwareProfile.vmSize`, `storageProfile.dataDisks[].diskSizeGB` (128) |
//! | storage account | `storageGB` (100), `monthlyTransactions` (1,000,000) |
//! | SQL database | `maxSizeGB` (tier's included size) |
//! | app service / plan | `instanceCount` (1) |
//! | function app | `monthlyExecutions` (5,000,000) |
//! | application gateway | `dataProcessedGB` (100) |
//! | load balancer | `dataProcessedGB` (50) |
//! | front door | `routingRules` (5), `dataTransferGB` (100) |
//! | key vault | `monthlyOperations` (100,000), `hsmKeys` (0) |
//! | cosmos db | `throughput` RU/s (400), `storageGB` (10) |
//! | container registry | `storageGB` (50) |
//! | kubernetes service | `nodeCount` (3), `nodeSize` (Standard_D2s_v3) |
//! | app insights / log analytics | `monthlyIngestionGB` (20 / 50) |
//! | service bus | `monthlyOperations` (13,000,000) |
//! | event hub | `throughputUnits` (1) |
//! | api management | `capacity` (1), `monthlyCalls` (1,000,000) |
//! | cdn | `dataTransferGB` (100) |
//! | traffic manager | `monthlyQueries` (1,000,000), `endpoints` (2) |
//! | recovery services vault | `protectedInstances` (1), `backupStorageGB` (100) |

use crate::error::{PricingError, PricingResult};
use crate::models::{CostCategory, CostFactor, Currency, Money};
use core_config::Environment;
use domain_architecture::{CanonicalResourceType, ResourceNode};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use CanonicalResourceType as T;

/// Version of the rate tables, surfaced in every report.
pub const PRICING_VERSION: &str = "azure-payg-usd-2024.06";

/// Highest monthly cost, in USD, accepted for a single line.
pub const MAX_MONTHLY_COST: f64 = 1_000_000_000.0;

const HOURS_PER_MONTH: f64 = 730.0;

/// Stored-data size keys, camelCase first.
const STORAGE_GB_PATHS: &[&str] = &["storageGB", "sizeGB", "storage_gb", "size_gb"];

/// Checked after an entry's own SKU paths.
const GENERIC_SKU_PATHS: &[&str] = &["skuName", "sku_name", "tier"];

/// Prices for one SKU. Field meaning depends on the entry's formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateCard {
    pub sku: &'static str,
    #[serde(skip)]
    pub aliases: &'static [&'static str],
    /// Fixed monthly charge
    pub monthly_base: f64,
    /// Price per metered unit (GB, million operations, ...)
    pub unit_rate: f64,
    /// Metered units covered by the base charge
    pub included_units: f64,
    /// Metered units assumed when the resource does not say
    pub default_usage: f64,
    /// Second metered dimension (transactions, rules, HSM keys, ...)
    pub secondary_rate: f64,
}

impl RateCard {
    const fn flat(sku: &'static str, monthly_base: f64) -> Self {
        Self {
            sku,
            aliases: &[],
            monthly_base,
            unit_rate: 0.0,
            included_units: 0.0,
            default_usage: 0.0,
            secondary_rate: 0.0,
        }
    }

    const fn metered(self, unit_rate: f64, included_units: f64, default_usage: f64) -> Self {
        Self {
            unit_rate,
            included_units,
            default_usage,
            ..self
        }
    }

    const fn secondary(self, secondary_rate: f64) -> Self {
        Self {
            secondary_rate,
            ..self
        }
    }

    const fn aka(self, aliases: &'static [&'static str]) -> Self {
        Self { aliases, ..self }
    }

    /// Case- and punctuation-insensitive match; a `Standard_` prefix on either
    /// side is optional.
    pub fn matches(&self, sku: &str) -> bool {
        let wanted = compact(sku);
        if wanted.is_empty() {
            return false;
        }
        std::iter::once(self.sku)
            .chain(self.aliases.iter().copied())
            .map(compact)
            .any(|candidate| {
                candidate == wanted
                    || candidate.strip_prefix("standard") == Some(wanted.as_str())
                    || wanted.strip_prefix("standard") == Some(candidate.as_str())
            })
    }
}

fn compact(label: &str) -> String {
    label
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// SKU the recommendation step expects for each environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecommendedSkus {
    pub development: &'static str,
    pub staging: &'static str,
    pub production: &'static str,
}

impl RecommendedSkus {
    const fn all(sku: &'static str) -> Self {
        Self {
            development: sku,
            staging: sku,
            production: sku,
        }
    }

    pub fn for_environment(&self, environment: Environment) -> &'static str {
        match environment {
            Environment::Development => self.development,
            Environment::Staging => self.staging,
            Environment::Production => self.production,
        }
    }
}

/// Base monthly cost before multipliers, with the factors and assumptions behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub base_monthly: f64,
    pub cost_factors: Vec<CostFactor>,
    pub assumptions: Vec<String>,
}

pub type PricingFormula = fn(&RateCard, Usage<'_>) -> Quote;

/// Catalog record for one canonical type
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub resource_type: CanonicalResourceType,
    pub category: CostCategory,
    pub default_sku: &'static str,
    pub recommended: RecommendedSkus,
    pub rate_cards: &'static [RateCard],
    /// Property paths consulted for a SKU when the node carries none
    #[serde(skip)]
    pub sku_paths: &'static [&'static str],
    #[serde(skip)]
    pub formula: PricingFormula,
}

impl CatalogEntry {
    pub fn card(&self, sku: &str) -> Option<&RateCard> {
        self.rate_cards.iter().find(|card| card.matches(sku))
    }

    pub fn default_card(&self) -> Option<&RateCard> {
        self.card(self.default_sku)
    }

    pub fn recommended_card(&self, environment: Environment) -> Option<&RateCard> {
        self.card(self.recommended.for_environment(environment))
    }
}

/// Property reader that records an assumption for every defaulted input.
pub struct Usage<'a> {
    node: &'a ResourceNode,
    assumptions: Vec<String>,
}

impl<'a> Usage<'a> {
    pub fn new(node: &'a ResourceNode) -> Self {
        Self {
            node,
            assumptions: Vec::new(),
        }
    }

    /// First non-negative number found at `paths`, else `default`.
    ///
    /// `assumption` is recorded with `{}` replaced by the default.
    pub fn get(&mut self, paths: &[&str], default: f64, assumption: &str) -> f64 {
        let supplied = paths
            .iter()
            .find_map(|path| self.node.number(path))
            .filter(|value| value.is_finite() && *value >= 0.0);
        match supplied {
            Some(value) => value,
            None => {
                self.assume(assumption.replace("{}", &format_quantity(default)));
                default
            }
        }
    }

    pub fn text(&self, paths: &[&str]) -> Option<String> {
        paths.iter().find_map(|path| self.node.text(path))
    }

    pub fn node(&self) -> &'a ResourceNode {
        self.node
    }

    pub fn assume(&mut self, assumption: impl Into<String>) {
        self.assumptions.push(assumption.into());
    }

    fn finish(self, base_monthly: f64, cost_factors: Vec<CostFactor>) -> Quote {
        Quote {
            base_monthly,
            cost_factors,
            assumptions: self.assumptions,
        }
    }
}

/// Whole numbers print without decimals and with thousands separators.
pub fn format_quantity(value: f64) -> String {
    if value.fract() != 0.0 {
        return format!("{value}");
    }
    let digits = format!("{}", value.abs() as u64);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if value < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn usd(value: f64) -> String {
    format!("${value:.2}")
}

// ============================================================================
// Rate cards
// ============================================================================

static VM_CARDS: &[RateCard] = &[
    RateCard::flat("Standard_B1s", 7.59),
    RateCard::flat("Standard_B2s", 30.37),
    RateCard::flat("Standard_D2s_v3", 70.08),
    RateCard::flat("Standard_D4s_v3", 140.16),
    RateCard::flat("Standard_F2s_v2", 60.74),
    RateCard::flat("Standard_F4s_v2", 121.47),
];

static STORAGE_CARDS: &[RateCard] = &[
    RateCard::flat("Standard_LRS", 0.0)
        .metered(0.0184, 0.0, 100.0)
        .secondary(0.0004),
    RateCard::flat("Standard_ZRS", 0.0)
        .metered(0.023, 0.0, 100.0)
        .secondary(0.0004),
    RateCard::flat("Standard_GRS", 0.0)
        .metered(0.0368, 0.0, 100.0)
        .secondary(0.0004),
    RateCard::flat("Premium_LRS", 0.0)
        .metered(0.15, 0.0, 100.0)
        .secondary(0.0013),
];

static SQL_CARDS: &[RateCard] = &[
    RateCard::flat("Basic", 4.99).metered(0.17, 2.0, 2.0),
    RateCard::flat("S0", 15.00).metered(0.17, 250.0, 250.0),
    RateCard::flat("S1", 30.00).metered(0.17, 250.0, 250.0),
    RateCard::flat("S2", 75.00).metered(0.17, 250.0, 250.0),
    RateCard::flat("P1", 465.00).metered(0.17, 1000.0, 1000.0),
    RateCard::flat("P2", 930.00).metered(0.17, 1000.0, 1000.0),
];

static APP_SERVICE_CARDS: &[RateCard] = &[
    RateCard::flat("F1", 0.0).aka(&["Free"]),
    RateCard::flat("D1", 9.49).aka(&["Shared"]),
    RateCard::flat("B1", 13.14).aka(&["Basic_B1"]),
    RateCard::flat("B2", 26.28).aka(&["Basic_B2"]),
    RateCard::flat("B3", 52.56).aka(&["Basic_B3"]),
    RateCard::flat("S1", 70.08),
    RateCard::flat("S2", 140.16),
    RateCard::flat("S3", 280.32),
    RateCard::flat("P1v2", 175.20).aka(&["P1", "Premium_P1"]),
    RateCard::flat("P2v2", 350.40).aka(&["P2", "Premium_P2"]),
    RateCard::flat("P3v2", 700.80).aka(&["P3", "Premium_P3"]),
];

static FUNCTION_CARDS: &[RateCard] = &[
    RateCard::flat("Y1", 0.0)
        .metered(0.20, 1_000_000.0, 5_000_000.0)
        .aka(&["Consumption", "Dynamic"]),
    RateCard::flat("EP1", 146.00).aka(&["ElasticPremium_EP1"]),
    RateCard::flat("EP2", 292.00).aka(&["ElasticPremium_EP2"]),
    RateCard::flat("EP3", 584.00).aka(&["ElasticPremium_EP3"]),
];

static APP_GATEWAY_CARDS: &[RateCard] = &[
    RateCard::flat("Standard_Small", 21.90).metered(0.008, 0.0, 100.0),
    RateCard::flat("Standard_Medium", 43.80).metered(0.008, 0.0, 100.0),
    RateCard::flat("Standard_Large", 87.60).metered(0.008, 0.0, 100.0),
    RateCard::flat("WAF_Medium", 175.20).metered(0.008, 0.0, 100.0),
    RateCard::flat("WAF_Large", 350.40).metered(0.008, 0.0, 100.0),
];

static LOAD_BALANCER_CARDS: &[RateCard] = &[
    RateCard::flat("Basic", 0.0),
    RateCard::flat("Standard", 18.25).metered(0.005, 0.0, 50.0),
];

static FRONT_DOOR_CARDS: &[RateCard] = &[
    RateCard::flat("Standard", 22.00)
        .metered(0.085, 0.0, 100.0)
        .secondary(1.00)
        .aka(&["Standard_AzureFrontDoor"]),
    RateCard::flat("Premium", 330.00)
        .metered(0.085, 0.0, 100.0)
        .secondary(1.00)
        .aka(&["Premium_AzureFrontDoor"]),
];

static FREE_CARDS: &[RateCard] = &[RateCard::flat("Standard", 0.0)];

static PUBLIC_IP_CARDS: &[RateCard] = &[
    RateCard::flat("Basic", 2.92),
    RateCard::flat("Standard", 3.65),
];

static KEY_VAULT_CARDS: &[RateCard] = &[
    RateCard::flat("Standard", 0.0).metered(0.03, 0.0, 100_000.0),
    RateCard::flat("Premium", 0.0)
        .metered(0.03, 0.0, 100_000.0)
        .secondary(1.00),
];

static COSMOS_CARDS: &[RateCard] = &[RateCard::flat("Standard", 0.0)
    .metered(0.008, 0.0, 400.0)
    .secondary(0.25)
    .aka(&["Provisioned"])];

static REDIS_CARDS: &[RateCard] = &[
    RateCard::flat("Basic_C0", 15.18),
    RateCard::flat("Basic_C1", 30.37),
    RateCard::flat("Standard_C0", 30.37),
    RateCard::flat("Standard_C1", 60.74),
    RateCard::flat("Premium_P1", 455.10),
];

static REGISTRY_CARDS: &[RateCard] = &[
    RateCard::flat("Basic", 5.00).metered(0.10, 10.0, 50.0),
    RateCard::flat("Standard", 20.00).metered(0.10, 100.0, 50.0),
    RateCard::flat("Premium", 50.00).metered(0.10, 500.0, 50.0),
];

static AKS_CARDS: &[RateCard] = &[
    RateCard::flat("Free", 0.0),
    RateCard::flat("Standard", 73.00),
];

static INSIGHTS_CARDS: &[RateCard] = &[RateCard::flat("PayAsYouGo", 0.0)
    .metered(2.30, 5.0, 20.0)
    .aka(&["Pay-as-you-go"])];

static LOG_ANALYTICS_CARDS: &[RateCard] = &[RateCard::flat("PerGB2018", 0.0)
    .metered(2.30, 5.0, 50.0)
    .aka(&["Per-GB", "PerGB"])];

static SERVICE_BUS_CARDS: &[RateCard] = &[
    RateCard::flat("Basic", 0.0).metered(0.05, 0.0, 13_000_000.0),
    RateCard::flat("Standard", 9.81).metered(0.80, 13_000_000.0, 13_000_000.0),
    RateCard::flat("Premium", 677.08),
];

static EVENT_HUB_CARDS: &[RateCard] = &[
    RateCard::flat("Basic", 10.95),
    RateCard::flat("Standard", 21.90),
    RateCard::flat("Premium", 871.70),
];

static API_MANAGEMENT_CARDS: &[RateCard] = &[
    RateCard::flat("Consumption", 0.0).metered(3.50, 1_000_000.0, 1_000_000.0),
    RateCard::flat("Developer", 48.04),
    RateCard::flat("Basic", 147.17),
    RateCard::flat("Standard", 686.72),
    RateCard::flat("Premium", 2795.17),
];

static CDN_CARDS: &[RateCard] = &[
    RateCard::flat("Standard_Microsoft", 0.0).metered(0.081, 0.0, 100.0),
    RateCard::flat("Standard_Verizon", 0.0).metered(0.081, 0.0, 100.0),
    RateCard::flat("Premium_Verizon", 0.0).metered(0.158, 0.0, 100.0),
];

static TRAFFIC_MANAGER_CARDS: &[RateCard] = &[RateCard::flat("Standard", 0.0)
    .metered(0.54, 0.0, 1_000_000.0)
    .secondary(0.36)];

static BACKUP_CARDS: &[RateCard] = &[RateCard::flat("Standard", 10.00)
    .metered(0.0224, 0.0, 100.0)
    .aka(&["RS0"])];

static GENERIC_COMPUTE_CARDS: &[RateCard] = &[RateCard::flat("Generic", 50.00)];
static GENERIC_STORAGE_CARDS: &[RateCard] = &[RateCard::flat("Generic", 10.00)];
static GENERIC_NETWORK_CARDS: &[RateCard] = &[RateCard::flat("Generic", 20.00)];

// ============================================================================
// Formulas
// ============================================================================

fn flat(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    let factors = vec![
        CostFactor::new("SKU", card.sku),
        CostFactor::new("Monthly Rate", usd(card.monthly_base)),
    ];
    usage.assume("Running 24/7 at list price");
    usage.finish(card.monthly_base, factors)
}

fn free(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    let factors = vec![CostFactor::new(card.sku, "Free")];
    usage.assume("No charge for the resource itself; peering, gateways and egress are billed separately");
    usage.finish(0.0, factors)
}

fn generic(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    let factors = vec![CostFactor::new("Estimate", usd(card.monthly_base))];
    usage.assume(format!(
        "Flat estimate for a resource classified only as '{}'",
        usage.node().canonical_type
    ));
    usage.finish(card.monthly_base, factors)
}

fn virtual_machine(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    const OS_DISK: f64 = 4.0;
    const DISK_UNIT_GB: f64 = 128.0;

    let disks: Vec<f64> = usage
        .node()
        .property("storageProfile.dataDisks")
        .and_then(|disks| disks.as_array())
        .map(|disks| {
            disks
                .iter()
                .map(|disk| {
                    disk.get("diskSizeGB")
                        .and_then(|size| size.as_f64())
                        .filter(|size| *size >= 0.0)
                        .unwrap_or(DISK_UNIT_GB)
                })
                .collect()
        })
        .unwrap_or_default();
    let disk_cost: f64 = disks.iter().map(|size| size / DISK_UNIT_GB * OS_DISK).sum();

    usage.assume("VM running 24/7");
    usage.assume("Standard SSD OS disk");
    let factors = vec![
        CostFactor::new("VM Size", card.sku),
        CostFactor::new("OS Disk", format!("Standard SSD ({})", usd(OS_DISK))),
        CostFactor::new("Data Disks", disks.len()),
    ];
    usage.finish(card.monthly_base + OS_DISK + disk_cost, factors)
}

fn storage_account(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    let gb = usage.get(STORAGE_GB_PATHS, card.default_usage, "{} GB stored per month");
    let transactions = usage.get(
        &["monthlyTransactions", "monthly_transactions"],
        1_000_000.0,
        "{} transactions per month",
    );
    let cost = gb * card.unit_rate + transactions / 10_000.0 * card.secondary_rate;
    let factors = vec![
        CostFactor::new("Storage Tier", card.sku),
        CostFactor::new("Storage", format!("{} GB", format_quantity(gb))),
        CostFactor::new("Transactions", format_quantity(transactions)),
    ];
    usage.finish(cost, factors)
}

fn sql_database(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    let size = usage.get(
        &["maxSizeGB", "sizeGB", "size_gb", "max_size_gb"],
        card.included_units,
        "{} GB database size (tier maximum)",
    );
    let overage = (size - card.included_units).max(0.0);
    let factors = vec![
        CostFactor::new("Service Tier", card.sku),
        CostFactor::new("Included Size", format!("{} GB", format_quantity(card.included_units))),
        CostFactor::new("Database Size", format!("{} GB", format_quantity(size))),
    ];
    if overage > 0.0 {
        usage.assume(format!(
            "{} GB above the included size billed at {}/GB",
            format_quantity(overage),
            usd(card.unit_rate)
        ));
    }
    usage.finish(card.monthly_base + overage * card.unit_rate, factors)
}

fn app_service(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    let instances = usage.get(&["instanceCount", "capacity"], 1.0, "{} instance");
    let factors = vec![
        CostFactor::new("Service Plan", card.sku),
        CostFactor::new("Instances", format_quantity(instances)),
    ];
    usage.finish(card.monthly_base * instances, factors)
}

fn function_app(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    let executions = if card.unit_rate > 0.0 {
        usage.get(
            &["monthlyExecutions"],
            card.default_usage,
            "{} executions per month",
        )
    } else {
        0.0
    };
    let billable = (executions - card.included_units).max(0.0);
    let factors = vec![
        CostFactor::new("Plan", card.sku),
        CostFactor::new("Executions", format_quantity(executions)),
    ];
    usage.finish(
        card.monthly_base + billable / 1_000_000.0 * card.unit_rate,
        factors,
    )
}

fn data_processing(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    let gb = if card.unit_rate > 0.0 {
        usage.get(
            &["dataProcessedGB"],
            card.default_usage,
            "{} GB data processed per month",
        )
    } else {
        0.0
    };
    let factors = vec![
        CostFactor::new("Tier", card.sku),
        CostFactor::new("Data Processing", format!("{} GB", format_quantity(gb))),
    ];
    usage.finish(card.monthly_base + gb * card.unit_rate, factors)
}

fn front_door(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    let rules = usage.get(&["routingRules"], 5.0, "{} routing rules");
    let gb = usage.get(
        &["dataTransferGB"],
        card.default_usage,
        "{} GB data transfer per month",
    );
    let factors = vec![
        CostFactor::new("Front Door Tier", card.sku),
        CostFactor::new("Routing Rules", format_quantity(rules)),
        CostFactor::new("Data Transfer", format!("{} GB", format_quantity(gb))),
    ];
    usage.finish(
        card.monthly_base + rules * card.secondary_rate + gb * card.unit_rate,
        factors,
    )
}

fn key_vault(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    let operations = usage.get(
        &["monthlyOperations"],
        card.default_usage,
        "{} operations per month",
    );
    let hsm_keys = if card.secondary_rate > 0.0 {
        usage.get(&["hsmKeys"], 0.0, "{} HSM-protected keys")
    } else {
        0.0
    };
    let factors = vec![
        CostFactor::new("Tier", card.sku),
        CostFactor::new("Operations", format_quantity(operations)),
        CostFactor::new("Rate", format!("{} per 10K operations", usd(card.unit_rate))),
    ];
    usage.finish(
        operations / 10_000.0 * card.unit_rate + hsm_keys * card.secondary_rate,
        factors,
    )
}

fn cosmos_db(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    let throughput = usage.get(
        &["throughput", "provisionedThroughput"],
        card.default_usage,
        "{} RU/s provisioned throughput",
    );
    let gb = usage.get(STORAGE_GB_PATHS, 10.0, "{} GB stored");
    let compute = throughput / 100.0 * card.unit_rate * HOURS_PER_MONTH;
    let factors = vec![
        CostFactor::new("Throughput", format!("{} RU/s", format_quantity(throughput))),
        CostFactor::new("Storage", format!("{} GB", format_quantity(gb))),
    ];
    usage.finish(compute + gb * card.secondary_rate, factors)
}

fn container_registry(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    let gb = usage.get(STORAGE_GB_PATHS, card.default_usage, "{} GB of images stored");
    let overage = (gb - card.included_units).max(0.0);
    let factors = vec![
        CostFactor::new("Registry Tier", card.sku),
        CostFactor::new("Included Storage", format!("{} GB", format_quantity(card.included_units))),
        CostFactor::new("Storage", format!("{} GB", format_quantity(gb))),
    ];
    usage.finish(card.monthly_base + overage * card.unit_rate, factors)
}

fn kubernetes(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    const DEFAULT_NODE_SIZE: &str = "Standard_D2s_v3";

    let nodes = usage.get(
        &["nodeCount", "agentPoolProfiles.0.count"],
        3.0,
        "{} worker nodes",
    );
    let requested = usage.text(&["nodeSize", "agentPoolProfiles.0.vmSize"]);
    let node_card = requested
        .as_deref()
        .and_then(|size| VM_CARDS.iter().find(|card| card.matches(size)));
    let node_card = match node_card {
        Some(card) => *card,
        None => {
            usage.assume(format!("{DEFAULT_NODE_SIZE} worker nodes"));
            VM_CARDS
                .iter()
                .find(|card| card.sku == DEFAULT_NODE_SIZE)
                .copied()
                .unwrap_or(RateCard::flat(DEFAULT_NODE_SIZE, 70.08))
        }
    };
    let factors = vec![
        CostFactor::new("Control Plane", card.sku),
        CostFactor::new("Node Size", node_card.sku),
        CostFactor::new("Nodes", format_quantity(nodes)),
    ];
    usage.finish(card.monthly_base + nodes * node_card.monthly_base, factors)
}

fn ingestion(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    let gb = usage.get(
        &["monthlyIngestionGB"],
        card.default_usage,
        "{} GB ingested per month",
    );
    let billable = (gb - card.included_units).max(0.0);
    let factors = vec![
        CostFactor::new("Data Ingestion", format!("{} GB", format_quantity(gb))),
        CostFactor::new(
            "Pricing",
            format!(
                "First {} GB free, then {}/GB",
                format_quantity(card.included_units),
                usd(card.unit_rate)
            ),
        ),
    ];
    usage.finish(billable * card.unit_rate, factors)
}

fn service_bus(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    let operations = if card.unit_rate > 0.0 {
        usage.get(
            &["monthlyOperations"],
            card.default_usage,
            "{} messaging operations per month",
        )
    } else {
        0.0
    };
    let billable = (operations - card.included_units).max(0.0);
    let factors = vec![
        CostFactor::new("Tier", card.sku),
        CostFactor::new("Operations", format_quantity(operations)),
    ];
    usage.finish(
        card.monthly_base + billable / 1_000_000.0 * card.unit_rate,
        factors,
    )
}

fn per_unit(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    let units = usage.get(&["throughputUnits", "capacity"], 1.0, "{} capacity unit");
    let factors = vec![
        CostFactor::new("Tier", card.sku),
        CostFactor::new("Units", format_quantity(units)),
    ];
    usage.finish(card.monthly_base * units, factors)
}

fn api_management(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    if card.unit_rate > 0.0 {
        let calls = usage.get(&["monthlyCalls"], card.default_usage, "{} API calls per month");
        let billable = (calls - card.included_units).max(0.0);
        let factors = vec![
            CostFactor::new("Tier", card.sku),
            CostFactor::new("Calls", format_quantity(calls)),
        ];
        return usage.finish(billable / 1_000_000.0 * card.unit_rate, factors);
    }
    per_unit(card, usage)
}

fn cdn(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    let gb = usage.get(
        &["dataTransferGB"],
        card.default_usage,
        "{} GB egress per month",
    );
    let factors = vec![
        CostFactor::new("Profile", card.sku),
        CostFactor::new("Data Transfer", format!("{} GB", format_quantity(gb))),
    ];
    usage.finish(gb * card.unit_rate, factors)
}

fn traffic_manager(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    let queries = usage.get(
        &["monthlyQueries"],
        card.default_usage,
        "{} DNS queries per month",
    );
    let endpoints = usage.get(&["endpoints"], 2.0, "{} monitored endpoints");
    let factors = vec![
        CostFactor::new("DNS Queries", format_quantity(queries)),
        CostFactor::new("Endpoints", format_quantity(endpoints)),
    ];
    usage.finish(
        queries / 1_000_000.0 * card.unit_rate + endpoints * card.secondary_rate,
        factors,
    )
}

fn backup_vault(card: &RateCard, mut usage: Usage<'_>) -> Quote {
    let instances = usage.get(&["protectedInstances"], 1.0, "{} protected instance");
    let gb = usage.get(
        &["backupStorageGB"],
        card.default_usage,
        "{} GB backup storage",
    );
    let factors = vec![
        CostFactor::new("Protected Instances", format_quantity(instances)),
        CostFactor::new("Backup Storage", format!("{} GB", format_quantity(gb))),
    ];
    usage.finish(card.monthly_base * instances + gb * card.unit_rate, factors)
}

// ============================================================================
// Catalog
// ============================================================================

/// Built-in catalog entries, one per priced canonical type.
pub fn builtin_entries() -> Vec<CatalogEntry> {
    use CostCategory::*;

    fn entry(
        resource_type: CanonicalResourceType,
        category: CostCategory,
        default_sku: &'static str,
        recommended: RecommendedSkus,
        rate_cards: &'static [RateCard],
        sku_paths: &'static [&'static str],
        formula: PricingFormula,
    ) -> CatalogEntry {
        CatalogEntry {
            resource_type,
            category,
            default_sku,
            recommended,
            rate_cards,
            sku_paths,
            formula,
        }
    }

    fn per_env(
        development: &'static str,
        staging: &'static str,
        production: &'static str,
    ) -> RecommendedSkus {
        RecommendedSkus {
            development,
            staging,
            production,
        }
    }

    vec![
        entry(
            T::VirtualMachine,
            Compute,
            "Standard_D2s_v3",
            per_env("Standard_B1s", "Standard_B2s", "Standard_D2s_v3"),
            VM_CARDS,
            &["hardwareProfile.vmSize", "vmSize"],
            virtual_machine,
        ),
        entry(
            T::AppService,
            Compute,
            "S1",
            per_env("F1", "S1", "P1v2"),
            APP_SERVICE_CARDS,
            &["appServicePlanSku"],
            app_service,
        ),
        entry(
            T::AppServicePlan,
            Compute,
            "S1",
            per_env("F1", "S1", "P1v2"),
            APP_SERVICE_CARDS,
            &[],
            app_service,
        ),
        entry(
            T::FunctionApp,
            Compute,
            "Y1",
            RecommendedSkus::all("Y1"),
            FUNCTION_CARDS,
            &["appServicePlanSku"],
            function_app,
        ),
        entry(
            T::KubernetesService,
            Compute,
            "Standard",
            per_env("Free", "Standard", "Standard"),
            AKS_CARDS,
            &["sku.tier"],
            kubernetes,
        ),
        entry(
            T::SqlDatabase,
            Database,
            "S2",
            per_env("Basic", "S1", "S2"),
            SQL_CARDS,
            &["sku.name", "requestedServiceObjectiveName"],
            sql_database,
        ),
        entry(
            T::CosmosDb,
            Database,
            "Standard",
            RecommendedSkus::all("Standard"),
            COSMOS_CARDS,
            &[],
            cosmos_db,
        ),
        entry(
            T::RedisCache,
            Database,
            "Standard_C1",
            per_env("Basic_C0", "Standard_C0", "Standard_C1"),
            REDIS_CARDS,
            &[],
            flat,
        ),
        entry(
            T::StorageAccount,
            Storage,
            "Standard_LRS",
            per_env("Standard_LRS", "Standard_LRS", "Standard_GRS"),
            STORAGE_CARDS,
            &[],
            storage_account,
        ),
        entry(
            T::RecoveryServicesVault,
            Storage,
            "Standard",
            RecommendedSkus::all("Standard"),
            BACKUP_CARDS,
            &[],
            backup_vault,
        ),
        entry(
            T::KeyVault,
            Security,
            "Standard",
            per_env("Standard", "Standard", "Premium"),
            KEY_VAULT_CARDS,
            &["sku.name"],
            key_vault,
        ),
        entry(
            T::ApplicationInsights,
            Monitoring,
            "PayAsYouGo",
            RecommendedSkus::all("PayAsYouGo"),
            INSIGHTS_CARDS,
            &[],
            ingestion,
        ),
        entry(
            T::LogAnalytics,
            Monitoring,
            "PerGB2018",
            RecommendedSkus::all("PerGB2018"),
            LOG_ANALYTICS_CARDS,
            &["sku.name"],
            ingestion,
        ),
        entry(
            T::FrontDoor,
            Networking,
            "Standard",
            per_env("Standard", "Standard", "Premium"),
            FRONT_DOOR_CARDS,
            &[],
            front_door,
        ),
        entry(
            T::ApplicationGateway,
            Networking,
            "Standard_Small",
            per_env("Standard_Small", "Standard_Medium", "WAF_Medium"),
            APP_GATEWAY_CARDS,
            &["sku.name"],
            data_processing,
        ),
        entry(
            T::LoadBalancer,
            Networking,
            "Standard",
            per_env("Basic", "Standard", "Standard"),
            LOAD_BALANCER_CARDS,
            &[],
            data_processing,
        ),
        entry(
            T::VirtualNetwork,
            Networking,
            "Standard",
            RecommendedSkus::all("Standard"),
            FREE_CARDS,
            &[],
            free,
        ),
        entry(
            T::Subnet,
            Networking,
            "Standard",
            RecommendedSkus::all("Standard"),
            FREE_CARDS,
            &[],
            free,
        ),
        entry(
            T::NetworkSecurityGroup,
            Networking,
            "Standard",
            RecommendedSkus::all("Standard"),
            FREE_CARDS,
            &[],
            free,
        ),
        entry(
            T::PublicIp,
            Networking,
            "Standard",
            RecommendedSkus::all("Standard"),
            PUBLIC_IP_CARDS,
            &[],
            flat,
        ),
        entry(
            T::ApiManagement,
            Networking,
            "Developer",
            per_env("Developer", "Developer", "Standard"),
            API_MANAGEMENT_CARDS,
            &[],
            api_management,
        ),
        entry(
            T::Cdn,
            Networking,
            "Standard_Microsoft",
            RecommendedSkus::all("Standard_Microsoft"),
            CDN_CARDS,
            &[],
            cdn,
        ),
        entry(
            T::TrafficManager,
            Networking,
            "Standard",
            RecommendedSkus::all("Standard"),
            TRAFFIC_MANAGER_CARDS,
            &[],
            traffic_manager,
        ),
        entry(
            T::ContainerRegistry,
            Other,
            "Standard",
            per_env("Basic", "Basic", "Standard"),
            REGISTRY_CARDS,
            &[],
            container_registry,
        ),
        entry(
            T::ServiceBus,
            Other,
            "Standard",
            per_env("Basic", "Standard", "Standard"),
            SERVICE_BUS_CARDS,
            &[],
            service_bus,
        ),
        entry(
            T::EventHub,
            Other,
            "Standard",
            per_env("Basic", "Standard", "Standard"),
            EVENT_HUB_CARDS,
            &[],
            per_unit,
        ),
        entry(
            T::GenericCompute,
            Compute,
            "Generic",
            RecommendedSkus::all("Generic"),
            GENERIC_COMPUTE_CARDS,
            &[],
            generic,
        ),
        entry(
            T::GenericStorage,
            Storage,
            "Generic",
            RecommendedSkus::all("Generic"),
            GENERIC_STORAGE_CARDS,
            &[],
            generic,
        ),
        entry(
            T::GenericNetwork,
            Networking,
            "Generic",
            RecommendedSkus::all("Generic"),
            GENERIC_NETWORK_CARDS,
            &[],
            generic,
        ),
    ]
}

/// A resolved pricing function: one entry at one rate card.
#[derive(Debug, Clone)]
pub struct PricingFunction<'a> {
    pub entry: &'a CatalogEntry,
    pub card: &'a RateCard,
    /// True when the catalog default replaced a missing or unknown SKU
    pub sku_defaulted: bool,
    /// Assumption explaining the SKU choice, when it was not the caller's
    pub sku_note: Option<String>,
}

/// Priced output of a [`PricingFunction`]
#[derive(Debug, Clone, PartialEq)]
pub struct PricedQuote {
    pub monthly_cost: Money,
    pub base_monthly: f64,
    pub cost_factors: Vec<CostFactor>,
    pub assumptions: Vec<String>,
}

impl PricingFunction<'_> {
    pub fn sku(&self) -> &'static str {
        self.card.sku
    }

    pub fn category(&self) -> CostCategory {
        self.entry.category
    }

    /// Price one resource: base formula × environment × region, rounded once.
    ///
    /// A result above [`MAX_MONTHLY_COST`] (or not a number at all) is
    /// [`PricingError::CostOutOfRange`].
    pub fn price(
        &self,
        node: &ResourceNode,
        environment_multiplier: f64,
        region_multiplier: f64,
    ) -> PricingResult<PricedQuote> {
        let mut usage = Usage::new(node);
        if let Some(note) = &self.sku_note {
            usage.assume(note.clone());
        }
        let quote = (self.entry.formula)(self.card, usage);
        let monthly = quote.base_monthly * environment_multiplier * region_multiplier;
        let out_of_range = || PricingError::CostOutOfRange {
            resource_id: node.id.clone(),
            monthly,
        };
        if !(0.0..=MAX_MONTHLY_COST).contains(&monthly) {
            return Err(out_of_range());
        }
        let monthly_cost =
            Money::checked_from_decimal(monthly, Currency::Usd).ok_or_else(out_of_range)?;

        Ok(PricedQuote {
            monthly_cost,
            base_monthly: quote.base_monthly,
            cost_factors: quote.cost_factors,
            assumptions: quote.assumptions,
        })
    }
}

/// Read-only catalog, shared behind an `Arc` once built.
#[derive(Debug, Clone)]
pub struct PricingCatalog {
    entries: BTreeMap<CanonicalResourceType, CatalogEntry>,
    version: String,
}

impl Default for PricingCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PricingCatalog {
    pub fn builtin() -> Self {
        Self::from_entries(builtin_entries(), PRICING_VERSION)
    }

    pub fn from_entries(entries: Vec<CatalogEntry>, version: &str) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.resource_type, entry))
                .collect(),
            version: version.to_string(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn entry(&self, resource_type: CanonicalResourceType) -> Option<&CatalogEntry> {
        self.entries.get(&resource_type)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn contains(&self, resource_type: CanonicalResourceType) -> bool {
        self.entries.contains_key(&resource_type)
    }

    /// SKU declared on the node, else the first SKU found at the entry's
    /// property paths, then at the generic `skuName`/`tier` keys.
    pub fn sku_for(&self, node: &ResourceNode) -> Option<String> {
        node.sku.clone().or_else(|| {
            self.entry(node.canonical_type)?
                .sku_paths
                .iter()
                .chain(GENERIC_SKU_PATHS)
                .find_map(|path| node.text(path))
        })
    }

    /// Resolve the pricing function for a type and optional SKU.
    ///
    /// Unknown SKUs fall back to the type's default SKU with a note; a type
    /// with no entry is [`PricingError::PricingUnavailable`].
    pub fn lookup(
        &self,
        resource_type: CanonicalResourceType,
        sku: Option<&str>,
    ) -> PricingResult<PricingFunction<'_>> {
        let entry = self
            .entry(resource_type)
            .ok_or(PricingError::PricingUnavailable(resource_type))?;

        if let Some(card) = sku.and_then(|sku| entry.card(sku)) {
            return Ok(PricingFunction {
                entry,
                card,
                sku_defaulted: false,
                sku_note: None,
            });
        }

        let card = entry
            .default_card()
            .ok_or(PricingError::PricingUnavailable(resource_type))?;
        let note = match sku {
            Some(requested) => {
                debug!(%resource_type, requested, default = card.sku, "Unknown SKU, using default");
                format!(
                    "SKU '{requested}' is not in the catalog; priced as default {}",
                    card.sku
                )
            }
            None => format!("No SKU supplied; default {} assumed", card.sku),
        };

        Ok(PricingFunction {
            entry,
            card,
            sku_defaulted: true,
            sku_note: Some(note),
        })
    }
}

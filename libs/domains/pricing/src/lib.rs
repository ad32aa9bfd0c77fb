//! Pricing Domain
//!
//! Cost estimation for normalized architectures.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │  Estimator   │  ← per-line pricing, totals, recommendations
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │   Catalog    │  ← rate cards + pricing formulas per canonical type
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │ Models/Config│  ← Money, line items, reports, multiplier tables
//! └──────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use core_config::Environment;
//! use domain_architecture::{CanonicalResourceType, ResourceNode};
//! use domain_pricing::CostEstimator;
//!
//! let nodes = vec![ResourceNode::new("db", CanonicalResourceType::SqlDatabase).with_sku("S2")];
//! let report = CostEstimator::default()
//!     .estimate(&nodes, Environment::Production, "eastus", chrono::Utc::now())
//!     .unwrap();
//! assert_eq!(report.total_monthly.to_decimal(), 75.0);
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod estimator;
pub mod models;
pub mod recommendations;

pub use catalog::{
    CatalogEntry, PricedQuote, PricingCatalog, PricingFormula, PricingFunction, RateCard,
    RecommendedSkus, MAX_MONTHLY_COST, PRICING_VERSION,
};
pub use config::{region_key, MultiplierTable, RegionMultiplier};
pub use error::{PricingError, PricingResult};
pub use estimator::{CostEstimator, DISCLAIMER};
pub use models::{
    CostCategory, CostFactor, CostLineItem, CostReport, Currency, LineStatus, Money,
    Recommendation, RecommendationKind, MICRO_UNITS,
};
pub use recommendations::{LineContext, RecommendationThresholds};

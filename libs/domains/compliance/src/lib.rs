//! Compliance Domain
//!
//! Policy rules and their evaluation against normalized architectures.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │    Engine    │  ← rule evaluation, enforcement, remediation actions
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │   Catalog    │  ← built-in baseline + Azure Policy JSON definitions
//! └──────┬───────┘
//!        │
//! ┌──────▼───────┐
//! │  Conditions  │  ← field tests over resource properties
//! └──────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use core_config::Environment;
//! use domain_architecture::{CanonicalResourceType, ResourceNode};
//! use domain_compliance::{ComplianceEngine, Severity};
//! use serde_json::json;
//!
//! let vault = ResourceNode::new("secrets", CanonicalResourceType::KeyVault)
//!     .with_property("publicNetworkAccess", json!("Enabled"));
//! let report = ComplianceEngine::default()
//!     .evaluate(&[vault], Environment::Production)
//!     .unwrap();
//! assert!(!report.compliant);
//! assert_eq!(report.count(Severity::Violation), 1);
//! ```

pub mod azure_policy;
pub mod builtin;
pub mod catalog;
pub mod condition;
pub mod enforcement;
pub mod engine;
pub mod error;
pub mod models;
pub mod rule;
pub mod templates;

pub use azure_policy::{parse_policy_document, DirectoryRuleSource};
pub use builtin::{builtin_rules, BUILTIN_CATALOG_VERSION};
pub use catalog::{RuleCatalog, RuleSource};
pub use condition::{Condition, FieldTest};
pub use enforcement::EnforcementTable;
pub use engine::ComplianceEngine;
pub use error::{ComplianceError, ComplianceResult};
pub use models::{
    summarize, ComplianceReport, PolicyFinding, RemediationAction, RuleCategory, Severity,
};
pub use rule::{PolicyRule, RuleCheck, RuleOrigin};
pub use templates::{TemplateContext, TemplateRenderer};

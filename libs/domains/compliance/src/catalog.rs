//! Policy Rule Catalog.

use crate::builtin::{builtin_rules, BUILTIN_CATALOG_VERSION};
use crate::error::ComplianceResult;
use crate::rule::PolicyRule;
use tracing::{info, warn};

/// Supplier of organization rules, consulted once at startup.
#[cfg_attr(test, mockall::automock)]
pub trait RuleSource: Send + Sync {
    /// Human-readable origin used in logs
    fn describe(&self) -> String;

    fn load(&self) -> ComplianceResult<Vec<PolicyRule>>;
}

/// Versioned, read-only rule collection.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleCatalog {
    rules: Vec<PolicyRule>,
    version: String,
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleCatalog {
    pub fn builtin() -> Self {
        Self::new(builtin_rules(), BUILTIN_CATALOG_VERSION)
    }

    pub fn new(rules: Vec<PolicyRule>, version: &str) -> Self {
        Self {
            rules,
            version: version.to_string(),
        }
    }

    /// Built-in rules followed by every source's rules.
    ///
    /// A failing source is logged and skipped; the catalog keeps what loaded.
    pub fn load(sources: &[&dyn RuleSource]) -> Self {
        let mut catalog = Self::builtin();
        for source in sources {
            match source.load() {
                Ok(rules) => {
                    info!(source = %source.describe(), rules = rules.len(), "Loaded custom rules");
                    catalog = catalog.with_custom_rules(rules);
                }
                Err(err) => {
                    warn!(source = %source.describe(), error = %err, "Skipping rule source");
                }
            }
        }
        catalog
    }

    /// Appends rules and tags the version with the custom rule count.
    pub fn with_custom_rules(mut self, rules: Vec<PolicyRule>) -> Self {
        if rules.is_empty() {
            return self;
        }
        self.rules.extend(rules);
        let custom = self
            .rules
            .iter()
            .filter(|rule| !matches!(rule.origin, crate::rule::RuleOrigin::Builtin))
            .count();
        let base = self
            .version
            .split_once("+custom.")
            .map(|(base, _)| base.to_string())
            .unwrap_or_else(|| self.version.clone());
        self.version = format!("{base}+custom.{custom}");
        self
    }

    /// Catalog restricted to the given rule ids, keeping catalog order.
    pub fn only(&self, ids: &[&str]) -> Self {
        Self {
            rules: self
                .rules
                .iter()
                .filter(|rule| ids.contains(&rule.id.as_str()))
                .cloned()
                .collect(),
            version: self.version.clone(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    pub fn enabled_rules(&self) -> impl Iterator<Item = &PolicyRule> {
        self.rules.iter().filter(|rule| rule.enabled)
    }

    pub fn get(&self, id: &str) -> Option<&PolicyRule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

//! Environment and region multiplier tables.

use crate::error::{PricingError, PricingResult};
use core_config::Environment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Region multipliers relative to the US baseline regions.
const REGION_MULTIPLIERS: &[(&str, f64)] = &[
    ("eastus", 1.0),
    ("eastus2", 1.0),
    ("westus", 1.0),
    ("westus2", 1.0),
    ("westus3", 1.0),
    ("centralus", 1.0),
    ("northcentralus", 1.0),
    ("southcentralus", 1.0),
    ("westcentralus", 1.0),
    ("canadacentral", 1.05),
    ("canadaeast", 1.05),
    ("brazilsouth", 1.15),
    ("northeurope", 1.08),
    ("westeurope", 1.08),
    ("uksouth", 1.10),
    ("ukwest", 1.10),
    ("francecentral", 1.10),
    ("germanywestcentral", 1.10),
    ("switzerlandnorth", 1.20),
    ("norwayeast", 1.15),
    ("eastasia", 1.12),
    ("southeastasia", 1.12),
    ("australiaeast", 1.15),
    ("australiasoutheast", 1.15),
    ("japaneast", 1.20),
    ("japanwest", 1.20),
    ("koreacentral", 1.15),
    ("koreasouth", 1.15),
    ("centralindia", 1.05),
    ("southindia", 1.05),
    ("westindia", 1.05),
    ("uaenorth", 1.18),
    ("southafricanorth", 1.15),
];

/// Lowercases and drops spaces, dashes and underscores: `"East US"` → `"eastus"`.
pub fn region_key(region: &str) -> String {
    region
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Region lookup outcome
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMultiplier {
    /// Normalized region key
    pub region: String,
    pub multiplier: f64,
    /// Set when the region was not in the table and 1.0 was applied
    pub warning: Option<String>,
}

/// Environment and region scaling factors.
///
/// Loadable from JSON:
///
/// ```json
/// { "environments": { "development": 0.5, "staging": 0.7, "production": 1.0 },
///   "regions": { "eastus": 1.0, "westeurope": 1.08 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplierTable {
    pub environments: BTreeMap<Environment, f64>,
    #[serde(default)]
    pub regions: BTreeMap<String, f64>,
}

impl Default for MultiplierTable {
    fn default() -> Self {
        Self {
            environments: BTreeMap::from([
                (Environment::Development, 0.5),
                (Environment::Staging, 0.7),
                (Environment::Production, 1.0),
            ]),
            regions: REGION_MULTIPLIERS
                .iter()
                .map(|(region, factor)| (region.to_string(), *factor))
                .collect(),
        }
    }
}

impl MultiplierTable {
    /// Parse and validate a table. Region keys are normalized with [`region_key`].
    pub fn from_json(json: &str) -> PricingResult<Self> {
        let parsed: MultiplierTable = serde_json::from_str(json)?;
        let table = Self {
            environments: parsed.environments,
            regions: parsed
                .regions
                .into_iter()
                .map(|(region, factor)| (region_key(&region), factor))
                .collect(),
        };
        table.validate()?;
        Ok(table)
    }

    /// Every factor must be finite and positive.
    pub fn validate(&self) -> PricingResult<()> {
        let environments = self
            .environments
            .iter()
            .map(|(env, factor)| (env.to_string(), *factor));
        let regions = self
            .regions
            .iter()
            .map(|(region, factor)| (region.clone(), *factor));

        for (key, factor) in environments.chain(regions) {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(PricingError::InvalidConfiguration(format!(
                    "multiplier for '{key}' must be a positive number, got {factor}"
                )));
            }
        }
        Ok(())
    }

    /// Environment factor; a table without the environment is a fatal error.
    pub fn environment_multiplier(&self, environment: Environment) -> PricingResult<f64> {
        self.environments.get(&environment).copied().ok_or_else(|| {
            PricingError::InvalidConfiguration(format!(
                "multiplier table has no entry for environment '{environment}'"
            ))
        })
    }

    /// Region factor; unknown or blank regions get 1.0 plus a warning.
    pub fn region_multiplier(&self, region: &str) -> RegionMultiplier {
        let key = region_key(region.trim());
        match self.regions.get(&key) {
            Some(factor) => RegionMultiplier {
                region: key,
                multiplier: *factor,
                warning: None,
            },
            None => RegionMultiplier {
                warning: Some(format!(
                    "Region '{}' is not in the multiplier table; baseline pricing (1.0) applied",
                    region.trim()
                )),
                region: key,
                multiplier: 1.0,
            },
        }
    }
}

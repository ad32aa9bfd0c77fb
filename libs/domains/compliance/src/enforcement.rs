use crate::error::{ComplianceError, ComplianceResult};
use crate::models::Severity;
use core_config::Environment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum severity surfaced per environment.
///
/// JSON form: `{ "production": "info", "staging": "warning", "development": "violation" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnforcementTable {
    levels: BTreeMap<Environment, Severity>,
}

impl Default for EnforcementTable {
    fn default() -> Self {
        Self {
            levels: BTreeMap::from([
                (Environment::Development, Severity::Violation),
                (Environment::Staging, Severity::Warning),
                (Environment::Production, Severity::Info),
            ]),
        }
    }
}

impl EnforcementTable {
    pub fn new(levels: BTreeMap<Environment, Severity>) -> Self {
        Self { levels }
    }

    pub fn from_json(json: &str) -> ComplianceResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Enforcement level; a table without the environment is a fatal error.
    pub fn level(&self, environment: Environment) -> ComplianceResult<Severity> {
        self.levels.get(&environment).copied().ok_or_else(|| {
            ComplianceError::InvalidConfiguration(format!(
                "enforcement table has no entry for environment '{environment}'"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_levels() {
        let table = EnforcementTable::default();
        assert_eq!(table.level(Environment::Production).unwrap(), Severity::Info);
        assert_eq!(table.level(Environment::Staging).unwrap(), Severity::Warning);
        assert_eq!(table.level(Environment::Development).unwrap(), Severity::Violation);
    }

    #[test]
    fn test_missing_environment_is_invalid_configuration() {
        let table = EnforcementTable::from_json(r#"{ "production": "critical" }"#).unwrap();
        assert_eq!(table.level(Environment::Production).unwrap(), Severity::Critical);

        let err = table.level(Environment::Development).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("development"));
    }

    #[test]
    fn test_unknown_severity_fails_to_parse() {
        assert!(EnforcementTable::from_json(r#"{ "production": "fatal" }"#).is_err());
    }
}

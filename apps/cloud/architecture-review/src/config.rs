//! Configuration for the architecture review CLI

use core_config::{env_or_default, ConfigError, Environment, FromEnv, LogFormat};
use std::path::PathBuf;

pub const DEFAULT_REGION: &str = "eastus";

/// Process-wide defaults; command-line flags override each field.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub environment: Environment,
    /// Used when neither `--region` nor the graph names a region
    pub region: String,
    /// Directory of Azure Policy JSON definitions loaded at startup
    pub policies_dir: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl FromEnv for Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            environment: env_or_default("REVIEW_ENVIRONMENT", "development").parse()?,
            region: env_or_default("REVIEW_REGION", DEFAULT_REGION),
            policies_dir: std::env::var("REVIEW_POLICIES_DIR")
                .ok()
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
            log_format: LogFormat::from_env()?,
        })
    }
}

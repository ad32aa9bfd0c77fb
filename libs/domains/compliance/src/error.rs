use std::path::PathBuf;
use thiserror::Error;

/// Result type for compliance operations
pub type ComplianceResult<T> = Result<T, ComplianceError>;

/// Errors that can occur in the compliance domain
#[derive(Debug, Error)]
pub enum ComplianceError {
    /// Enforcement table or rule catalog unusable for this run. Fatal.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// One rule could not be checked against one resource. Non-fatal: the
    /// engine reports it as an info finding.
    #[error("Rule {rule_id} could not be evaluated: {reason}")]
    RuleEvaluation { rule_id: String, reason: String },

    /// A message, remediation or auto-fix template failed to render
    #[error("Template error: {0}")]
    Template(String),

    /// Policy definition could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Policy definition is not the expected JSON shape
    #[error("Invalid policy definition: {0}")]
    InvalidPolicy(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ComplianceError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ComplianceError::InvalidConfiguration(_))
    }
}

impl From<handlebars::RenderError> for ComplianceError {
    fn from(err: handlebars::RenderError) -> Self {
        ComplianceError::Template(err.to_string())
    }
}

impl From<handlebars::TemplateError> for ComplianceError {
    fn from(err: handlebars::TemplateError) -> Self {
        ComplianceError::Template(err.to_string())
    }
}

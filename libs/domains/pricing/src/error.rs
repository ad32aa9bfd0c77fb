use domain_architecture::CanonicalResourceType;
use thiserror::Error;

/// Result type for pricing operations
pub type PricingResult<T> = Result<T, PricingError>;

/// Errors that can occur in the pricing domain
#[derive(Debug, Error)]
pub enum PricingError {
    /// No pricing model exists for the resource type. Non-fatal: the engine
    /// degrades the affected line to a warned zero-cost entry.
    #[error("Pricing unavailable for resource type '{0}'")]
    PricingUnavailable(CanonicalResourceType),

    /// A resource's inputs price it beyond the per-line ceiling. Non-fatal:
    /// the line is excluded from totals with a warning.
    #[error("Monthly cost {monthly} for resource '{resource_id}' is out of range")]
    CostOutOfRange { resource_id: String, monthly: f64 },

    /// Report totals no longer fit in micro-units. Fatal.
    #[error("Cost totals exceed the representable range")]
    TotalOutOfRange,

    /// A multiplier table is unusable for this run. Fatal.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Multiplier table JSON could not be parsed
    #[error("Failed to parse multiplier table: {0}")]
    Parse(#[from] serde_json::Error),
}

impl PricingError {
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            PricingError::PricingUnavailable(_) | PricingError::CostOutOfRange { .. }
        )
    }
}

//! Error taxonomy for the projection engine
//!
//! Two failure classes exist:
//! - [`ValidationError`]: malformed or out-of-range input. The caller fixes the
//!   scenario and retries.
//! - [`StatementImbalanceError`]: the balance-sheet identity broke. This is an
//!   engine defect; the run aborts and no partial output is returned.

use thiserror::Error;

/// Result type used throughout the engine
pub type Result<T> = std::result::Result<T, ModelError>;

/// Malformed or out-of-range scenario input
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending input (e.g. `revenue.streams[0].churn_rate`)
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Balance-sheet identity violated beyond tolerance
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "balance sheet does not balance in month {month}: assets {total_assets:.6} vs \
     liabilities + equity {total_liabilities_and_equity:.6} (difference {difference:.3e}, tolerance {tolerance:.3e})"
)]
pub struct StatementImbalanceError {
    pub month: u32,
    pub total_assets: f64,
    pub total_liabilities_and_equity: f64,
    pub difference: f64,
    pub tolerance: f64,
}

/// Any failure surfaced by a scenario run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    StatementImbalance(#[from] StatementImbalanceError),
}

impl ModelError {
    /// Whether the caller can recover by fixing inputs
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ModelError::Validation(_))
    }
}

/// Shorthand for building a validation failure wrapped as `ModelError`
pub(crate) fn invalid<T>(field: impl Into<String>, message: impl Into<String>) -> Result<T> {
    Err(ValidationError::new(field, message).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_is_recoverable() {
        let err: ModelError = ValidationError::new("horizon_months", "must be positive").into();
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "invalid horizon_months: must be positive");
    }

    #[test]
    fn test_imbalance_is_fatal() {
        let err: ModelError = StatementImbalanceError {
            month: 3,
            total_assets: 100.0,
            total_liabilities_and_equity: 99.0,
            difference: 1.0,
            tolerance: 1e-4,
        }
        .into();
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("month 3"));
    }
}

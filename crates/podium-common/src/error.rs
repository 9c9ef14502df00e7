//! Error types for the prize engine.

use thiserror::Error;

use crate::types::{DistributionType, RuleId};

/// Engine-level error type shared by the matcher, calculator, tracker and stores.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrizeError {
    /// Malformed rule or match context
    #[error("Validation error: {0}")]
    Validation(String),

    /// No rule matched and no active default rule exists
    #[error("No applicable prize rule for match type '{match_type}', game type '{game_type}'")]
    NoApplicableRule {
        match_type: String,
        game_type: String,
    },

    /// Distribution type has no computed path
    #[error("Unsupported distribution type: {0}")]
    UnsupportedDistributionType(DistributionType),

    /// Optimistic concurrency check failed on save
    #[error("Rule {rule_id} was modified concurrently (expected version {expected}, found {actual})")]
    ConcurrentModification {
        rule_id: RuleId,
        expected: u32,
        actual: u32,
    },

    /// Rule or version not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backing store failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl PrizeError {
    /// Returns the error code string for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            PrizeError::Validation(_) => "VALIDATION_ERROR",
            PrizeError::NoApplicableRule { .. } => "NO_APPLICABLE_RULE",
            PrizeError::UnsupportedDistributionType(_) => "UNSUPPORTED_DISTRIBUTION_TYPE",
            PrizeError::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            PrizeError::NotFound(_) => "NOT_FOUND",
            PrizeError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Whether the caller should re-read and retry the operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, PrizeError::ConcurrentModification { .. })
    }
}

/// Result type alias using PrizeError
pub type PrizeResult<T> = Result<T, PrizeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            PrizeError::Validation("bad".into()).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            PrizeError::UnsupportedDistributionType(DistributionType::Custom).to_string(),
            "Unsupported distribution type: custom"
        );
    }

    #[test]
    fn test_only_concurrent_modification_is_retryable() {
        let conflict = PrizeError::ConcurrentModification {
            rule_id: RuleId::nil(),
            expected: 2,
            actual: 3,
        };
        assert!(conflict.is_retryable());
        assert!(!PrizeError::NotFound("rule".into()).is_retryable());
    }
}

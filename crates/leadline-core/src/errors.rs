use serde::{Deserialize, Serialize};

use crate::validate::Issue;

/// One failed row in a bulk import. `row` is the 1-based CSV line number
/// including the header (first data row is 2); row 0 marks batch-level
/// failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

impl RowError {
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self { row, message: message.into() }
    }
}

/// Failure taxonomy for lead actions. Display strings are user-facing;
/// anything internal stays in logs.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ActionError {
    #[error("Please fix the highlighted fields.")]
    Validation { issues: Vec<Issue> },
    #[error("This record has been updated by someone else. Please refresh and try again.")]
    Conflict,
    #[error("Rate limit exceeded. Try again in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("You must be logged in to update a buyer.")]
    Unauthenticated,
    #[error("Buyer not found.")]
    NotFound,
    #[error("Something went wrong. Please try again.")]
    Storage(String),
    #[error("Import failed. Fix the listed rows and retry.")]
    ImportBatch { errors: Vec<RowError> },
    #[error("Failed to get AI suggestions.")]
    Suggestion,
}

impl ActionError {
    pub fn validation(issues: Vec<Issue>) -> Self {
        Self::Validation { issues }
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Conflict => "conflict",
            Self::RateLimited { .. } => "rate_limited",
            Self::Unauthenticated => "unauthenticated",
            Self::NotFound => "not_found",
            Self::Storage(_) => "storage",
            Self::ImportBatch { .. } => "import_batch",
            Self::Suggestion => "suggestion",
        }
    }

    /// Errors the client can resolve by retrying later, as opposed to
    /// fixing the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_user_facing() {
        assert_eq!(
            ActionError::Conflict.to_string(),
            "This record has been updated by someone else. Please refresh and try again."
        );
        assert_eq!(
            ActionError::RateLimited { retry_after_secs: 37 }.to_string(),
            "Rate limit exceeded. Try again in 37s"
        );
        assert_eq!(ActionError::NotFound.to_string(), "Buyer not found.");
        assert_eq!(
            ActionError::Unauthenticated.to_string(),
            "You must be logged in to update a buyer."
        );
        assert_eq!(ActionError::Suggestion.to_string(), "Failed to get AI suggestions.");
    }

    #[test]
    fn storage_detail_never_reaches_display() {
        let err = ActionError::Storage("connection refused to 10.0.0.5:5432".into());
        assert!(!err.to_string().contains("10.0.0.5"));
    }

    #[test]
    fn error_kind_strings() {
        assert_eq!(ActionError::Conflict.error_kind(), "conflict");
        assert_eq!(ActionError::RateLimited { retry_after_secs: 1 }.error_kind(), "rate_limited");
        assert_eq!(ActionError::validation(vec![]).error_kind(), "validation");
        assert_eq!(ActionError::ImportBatch { errors: vec![] }.error_kind(), "import_batch");
    }

    #[test]
    fn retryable_classification() {
        assert!(ActionError::RateLimited { retry_after_secs: 5 }.is_retryable());
        assert!(ActionError::Storage("io".into()).is_retryable());
        assert!(!ActionError::Conflict.is_retryable());
        assert!(!ActionError::Unauthenticated.is_retryable());
    }
}

//! Error types for case operations
//!
//! Errors are classified by recoverability:
//! - Retryable: completion service failures, store conflicts
//! - NonRetryable: unknown case IDs, invalid arguments

use thiserror::Error;

use crate::store::StoreError;

/// Error types for caller-facing case operations
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("Case not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Client file extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Document analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Case store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl CaseError {
    /// Returns true if repeating the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CaseError::ExtractionFailed(_)
                | CaseError::AnalysisFailed(_)
                | CaseError::StoreUnavailable(_)
        )
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CaseError::NotFound(_) => "Refresh the case list; the case may have been removed.",
            CaseError::InvalidArgument(_) => "Check the value entered and try again.",
            CaseError::ExtractionFailed(_) => {
                "The client file could not be read by the assistant. Try again or check the file contents."
            }
            CaseError::AnalysisFailed(_) => {
                "The document could not be analyzed. Try again or log the update manually."
            }
            CaseError::StoreUnavailable(StoreError::RevisionConflict { .. }) => {
                "Cases changed while this operation ran. Reload and try again."
            }
            CaseError::StoreUnavailable(StoreError::NotInitialized(_)) => {
                "Run `chasedesk reset` to create the case store."
            }
            CaseError::StoreUnavailable(_) => "Check file permissions and disk space.",
        }
    }
}

/// Serializable error representation for presentation layers
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationError {
    pub message: String,
    pub error_type: ErrorType,
    pub can_retry: bool,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorType {
    NotFound,
    InvalidArgument,
    ExtractionFailed,
    AnalysisFailed,
    StoreUnavailable,
}

impl From<&CaseError> for OperationError {
    fn from(err: &CaseError) -> Self {
        let error_type = match err {
            CaseError::NotFound(_) => ErrorType::NotFound,
            CaseError::InvalidArgument(_) => ErrorType::InvalidArgument,
            CaseError::ExtractionFailed(_) => ErrorType::ExtractionFailed,
            CaseError::AnalysisFailed(_) => ErrorType::AnalysisFailed,
            CaseError::StoreUnavailable(_) => ErrorType::StoreUnavailable,
        };

        OperationError {
            message: err.to_string(),
            error_type,
            can_retry: err.is_retryable(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}

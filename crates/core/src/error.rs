// Central Error Type for the Application

use crate::domain::ParticipantId;
use thiserror::Error;

/// Application-level error type
///
/// Rejections are NOT errors: they are reported as `Decision::Rejected`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The store already holds an entry for this participant at this instant.
    /// Retryable: re-stamp the submission and try again.
    #[error("Duplicate submission from {participant_id} at {submitted_at}. Try again.")]
    DuplicateSubmission {
        participant_id: ParticipantId,
        submitted_at: i64,
    },

    #[error("Could not resolve entry metadata: {0}")]
    Resolution(#[from] crate::port::ResolutionError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Notification error: {0}")]
    Notification(String),
}

impl AppError {
    /// Whether the caller may retry the same attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::DuplicateSubmission { .. })
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// Note: sqlx::Error conversion is handled in infra-sqlite crate
// by mapping to AppError::Persistence / AppError::DuplicateSubmission

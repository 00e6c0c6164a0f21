use common::package_manifest::FieldErrors;
use common::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Submission input failed validation. Recorded on the submission row
    /// as field errors, never retried.
    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The operation is not valid for the row's current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("{0}")]
    Internal(String),
}

impl WorkerError {
    /// Whether retrying the task could help.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Db(_) | Self::Internal(_) => true,
            Self::Storage(e) => e.is_retryable(),
            Self::Serialization(_)
            | Self::Validation(_)
            | Self::NotFound(_)
            | Self::PermissionDenied(_)
            | Self::InvalidState(_) => false,
        }
    }

    pub fn validation(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
        Self::Validation(errors)
    }
}

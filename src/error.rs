//! Error types for the label engine
//!
//! Validation failures are the only errors the engine itself produces.
//! Duplicate-print conflicts are not errors: they surface as
//! `PrintValidationResult::NeedsConfirmation`.

use thiserror::Error;

/// Main error type for engine operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invoice number is required")]
    MissingInvoiceNumber,

    #[error("Volume count must be positive, got {0}")]
    InvalidVolumeCount(i64),

    #[error("No existing volume '{volume_id}' to reprint")]
    NothingToReprint { volume_id: String },

    #[error("Parent label not found: {0}")]
    ParentLabelNotFound(String),

    #[error("Parent label id must not be blank")]
    InvalidParentLabelId,

    #[error("Parent label already exists: {0}")]
    DuplicateParentLabel(String),

    #[error("Volume not found: {0}")]
    VolumeNotFound(String),

    #[error("No print is waiting for confirmation")]
    NoPendingPrint,

    #[error("Session closed")]
    SessionClosed,
}

impl EngineError {
    /// Validation errors are raised before any state is touched
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingInvoiceNumber
                | Self::InvalidVolumeCount(_)
                | Self::InvalidParentLabelId
                | Self::DuplicateParentLabel(_)
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

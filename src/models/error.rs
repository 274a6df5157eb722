use thiserror::Error;

/// Engine-level errors surfaced to the caller of a movement session
#[derive(Debug, Error)]
pub enum MovementError {
    #[error("Document has blocking validation errors: {0:?}")]
    ValidationFailed(Vec<String>),

    #[error("Submission rejected: {message}")]
    SubmissionRejected { message: String },

    #[error("Unknown item '{item_key}'")]
    UnknownItem { item_key: String },

    #[error("Line index {index} out of range")]
    LineOutOfRange { index: usize },

    #[error("Ledger error: {0}")]
    Ledger(String),
}

//! Session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session store has not finished loading")]
    NotReady,

    #[error("Storage error: {0}")]
    Storage(#[from] warden_storage::StorageError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid load state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Session writer has stopped")]
    Closed,
}

//! Session errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Entropy unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Reserved session field: {0}")]
    ReservedField(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SessionError {
    /// Failures that abort the request as an internal error.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::EntropyUnavailable(_) | Self::StoreError(_))
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

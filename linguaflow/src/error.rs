//! Error types for Linguaflow
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized to a UI shell as plain messages.

use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The request never produced a usable HTTP response (connect, timeout, body decode).
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with an error envelope or a non-2xx status.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A failure observed by several coalesced callers of the same request.
    #[error("{0}")]
    Shared(#[from] Arc<AppError>),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// True for a 401 from the API, including one surfaced through a coalesced request.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            AppError::Unauthorized => true,
            AppError::Shared(inner) => inner.is_unauthorized(),
            _ => false,
        }
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_seen_through_shared() {
        let shared = AppError::Shared(Arc::new(AppError::Unauthorized));
        assert!(shared.is_unauthorized());

        let other = AppError::Shared(Arc::new(AppError::Generic("boom".to_string())));
        assert!(!other.is_unauthorized());
    }

    #[test]
    fn test_api_error_displays_server_message() {
        let err = AppError::Api {
            status: 400,
            message: "Card already exists".to_string(),
        };
        assert_eq!(err.to_string(), "Card already exists");
        assert_eq!(serde_json::to_string(&err).unwrap(), "\"Card already exists\"");
    }
}

//! Authentication errors.

use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Token missing or blank.
    #[error("token invalid or empty")]
    InvalidToken,

    /// User record is not a non-empty JSON object.
    #[error("invalid user record: {0}")]
    InvalidUser(String),

    /// Durable storage error.
    #[error("cache error: {0}")]
    Cache(#[from] turbo_cache::CacheError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AuthError {
    fn from(e: serde_json::Error) -> Self {
        AuthError::Serialization(e.to_string())
    }
}

//! Transport-level failures.

use thiserror::Error;

/// A request that could not be completed or whose body could not be read.
///
/// Non-2xx statuses are not errors at this layer; they come back as a
/// [`Response`](crate::Response) for the caller to judge.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection or protocol failure.
    #[error("Request failed: {0}")]
    RequestError(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The body was not valid UTF-8 or JSON.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Request timed out")]
    Timeout,

    /// A request body could not be encoded.
    #[error("JSON error: {0}")]
    JsonError(String),
}

impl FetchError {
    /// True for failures worth retrying later (timeouts and dropped
    /// connections), as opposed to malformed requests or bodies.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Timeout | FetchError::RequestError(_))
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::JsonError(e.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_builder() {
            FetchError::InvalidUrl(e.to_string())
        } else {
            FetchError::RequestError(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::Timeout.is_transient());
        assert!(FetchError::RequestError("reset".into()).is_transient());
        assert!(!FetchError::ParseError("<html>".into()).is_transient());
    }
}

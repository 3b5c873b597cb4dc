//! Commerce error types.

use thiserror::Error;
use turbo_data::FetchError;

/// Failures talking to the storefront REST API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend answered 401. Stored credentials have been cleared.
    #[error("Unauthorized")]
    Unauthorized,

    /// Non-2xx response other than 401.
    #[error("API request failed ({status}): {message}")]
    Status { status: u16, message: String },

    /// The request never completed.
    #[error("Transport error: {0}")]
    Transport(#[from] FetchError),

    /// The body was not the JSON we asked for.
    #[error("Invalid response body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    /// Check if this error is the 401 session reset.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// Errors surfaced by cart operations.
///
/// Remote failures during background reconciliation are not errors; they are
/// reported through [`SyncOutcome`](crate::cart::SyncOutcome).
#[derive(Error, Debug)]
pub enum CartError {
    /// No signed-in user. The visitor has been sent to login.
    #[error("Sign in to use the cart")]
    Unauthenticated,

    /// Invalid quantity.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// Quantity exceeds maximum allowed.
    #[error("Quantity {0} exceeds maximum allowed ({1})")]
    QuantityExceedsLimit(u64, u32),

    /// Background reconciliation needs an async runtime.
    #[error("No async runtime available for cart sync")]
    NoRuntime,

    /// Remote call made on the caller's behalf.
    #[error(transparent)]
    Api(#[from] ApiError),
}

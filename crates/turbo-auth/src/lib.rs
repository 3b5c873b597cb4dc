//! Authentication module for TurboCommerce.
//!
//! The storefront does not run the sign-in protocol itself. It only reads
//! the credentials the sign-in flow left in durable storage, gates cart
//! mutations on them, and wipes them when the backend answers 401.

mod error;
mod gate;
mod identity;
mod reset;

pub use error::AuthError;
pub use gate::AuthGate;
pub use identity::{
    parse_user, user_id_of, Identity, UserRecord, TOKEN_KEY, USER_ID_KEY, USER_KEY,
};
pub use reset::{
    LoggingNavigator, Navigator, RecordingNavigator, SessionReset, LOGIN_PATH, RESET_BURST_WINDOW,
};

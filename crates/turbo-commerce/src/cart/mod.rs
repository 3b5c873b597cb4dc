//! Shopping cart module.
//!
//! Contains the locally stored cart lines, the optimistic reconciler that
//! keeps them in step with the server, and the add-to-cart indicator.

mod feedback;
mod line;
mod reconciler;

pub use feedback::{AddFeedback, FeedbackState, DEFAULT_FEEDBACK_DELAY};
pub use line::{CartLine, CartLines, CART_ITEMS_KEY, MAX_QUANTITY_PER_ITEM};
pub use reconciler::{CartReconciler, CartRemote, CartSync, SyncOutcome, SyncState};

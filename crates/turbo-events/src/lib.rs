//! In-process publish/subscribe bus for storefront notifications.
//!
//! Components that change shared state (the cart reconciler, order flows)
//! publish a [`StoreEvent`]; anything that renders derived state (cart badge,
//! order count) subscribes without knowing who publishes.
//!
//! ```rust,ignore
//! use turbo_events::{EventBus, StoreEvent};
//!
//! let bus = EventBus::new();
//! let sub = bus.subscribe(StoreEvent::CartUpdated, |_| refresh_badge());
//! bus.publish(StoreEvent::CartUpdated); // refresh_badge() ran before this returns
//! drop(sub);                            // released
//! ```

mod bus;
mod event;

pub use bus::{EventBus, Subscription};
pub use event::{StoreEvent, UnknownEvent};

//! Storefront event names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payload-free notifications shared across the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreEvent {
    /// The local cart list changed (optimistically or after reconciliation).
    CartUpdated,
    /// The user's orders changed.
    OrdersUpdated,
}

impl StoreEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CartUpdated => "cart-updated",
            Self::OrdersUpdated => "orders-updated",
        }
    }
}

impl fmt::Display for StoreEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
#[error("unknown event: {0}")]
pub struct UnknownEvent(pub String);

impl FromStr for StoreEvent {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cart-updated" => Ok(Self::CartUpdated),
            "orders-updated" => Ok(Self::OrdersUpdated),
            other => Err(UnknownEvent(other.to_string())),
        }
    }
}

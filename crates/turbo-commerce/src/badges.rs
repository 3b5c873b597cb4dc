//! Header badge counts: unread messages, orders and cart lines.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tracing::{debug, warn};
use turbo_cache::mutex_lock;
use turbo_events::{EventBus, StoreEvent, Subscription};

use crate::api::StorefrontApi;

const SOURCE: &str = "commerce::badges";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeCounts {
    pub unread_messages: u64,
    pub orders: u64,
    pub cart_lines: u64,
}

/// Keeps the badge counts current.
///
/// The three counts are fetched concurrently and settle independently: a
/// failed fetch keeps that count's previous value.
pub struct BadgeBoard {
    api: StorefrontApi,
    counts: Mutex<BadgeCounts>,
}

impl BadgeBoard {
    pub fn new(api: StorefrontApi) -> Arc<Self> {
        Arc::new(Self {
            api,
            counts: Mutex::new(BadgeCounts::default()),
        })
    }

    /// Last known counts.
    pub fn counts(&self) -> BadgeCounts {
        *mutex_lock(&self.counts, SOURCE, "counts")
    }

    /// Fetch all counts. Does nothing when no user is signed in.
    pub async fn refresh(&self) -> BadgeCounts {
        let auth = self.api.auth();
        let (Some(_), Some(user_id)) = (auth.token(), auth.user_id()) else {
            debug!("no signed-in user, badge refresh skipped");
            return self.counts();
        };

        let (messages, orders, cart) = tokio::join!(
            self.api.count_unread_messages(&user_id),
            self.api.count_orders(),
            self.api.cart(),
        );

        let mut counts = mutex_lock(&self.counts, SOURCE, "refresh");
        match messages {
            Ok(n) => counts.unread_messages = n,
            Err(e) => warn!(error = %e, "unread message count failed"),
        }
        match orders {
            Ok(n) => counts.orders = n,
            Err(e) => warn!(error = %e, "order count failed"),
        }
        match cart {
            Ok(lines) => counts.cart_lines = lines.len() as u64,
            Err(e) => warn!(error = %e, "cart count failed"),
        }
        debug!(?counts, "badge counts refreshed");
        *counts
    }

    /// Refresh in the background whenever the cart or orders change.
    ///
    /// The board is held weakly, so dropping it stops the refreshes even
    /// while the subscriptions are alive.
    pub fn watch(self: &Arc<Self>, bus: &EventBus) -> Vec<Subscription> {
        [StoreEvent::CartUpdated, StoreEvent::OrdersUpdated]
            .into_iter()
            .map(|event| {
                let weak = Arc::downgrade(self);
                bus.subscribe(event, move |event| {
                    let Some(board) = weak.upgrade() else {
                        return;
                    };
                    match Handle::try_current() {
                        Ok(runtime) => {
                            runtime.spawn(async move {
                                board.refresh().await;
                            });
                        }
                        Err(_) => debug!(%event, "no async runtime, badge refresh skipped"),
                    }
                })
            })
            .collect()
    }
}

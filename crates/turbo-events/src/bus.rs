//! Synchronous publish/subscribe registry.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, Weak};

use tracing::trace;
use turbo_cache::mutex_lock;

use crate::StoreEvent;

const SOURCE: &str = "events::bus";

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;
type Release = Box<dyn FnOnce() + Send>;

struct Registry<E> {
    next_id: u64,
    handlers: HashMap<E, Vec<(u64, Handler<E>)>>,
}

impl<E: Eq + Hash> Registry<E> {
    fn contains(&self, event: &E, id: u64) -> bool {
        self.handlers
            .get(event)
            .is_some_and(|list| list.iter().any(|(hid, _)| *hid == id))
    }

    fn remove(&mut self, event: &E, id: u64) {
        if let Some(list) = self.handlers.get_mut(event) {
            list.retain(|(hid, _)| *hid != id);
            if list.is_empty() {
                self.handlers.remove(event);
            }
        }
    }
}

/// Process-wide event bus.
///
/// Dispatch is synchronous: [`publish`](Self::publish) runs every handler
/// registered for the event, in registration order, before it returns.
/// Nothing is buffered, so a publish with no subscribers is a no-op and a
/// late subscriber never sees earlier events.
///
/// Cloning the bus is cheap and every clone shares the same registry.
pub struct EventBus<E = StoreEvent> {
    registry: Arc<Mutex<Registry<E>>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                handlers: HashMap::new(),
            })),
        }
    }
}

impl<E> EventBus<E>
where
    E: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event`.
    ///
    /// The handler stays registered until the returned [`Subscription`] is
    /// unsubscribed or dropped.
    pub fn subscribe<F>(&self, event: E, handler: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = mutex_lock(&self.registry, SOURCE, "subscribe");
            let id = registry.next_id;
            registry.next_id += 1;
            registry
                .handlers
                .entry(event.clone())
                .or_default()
                .push((id, Arc::new(handler)));
            id
        };
        trace!(?event, id, "subscribed");

        let weak: Weak<Mutex<Registry<E>>> = Arc::downgrade(&self.registry);
        Subscription::new(Box::new(move || {
            if let Some(registry) = weak.upgrade() {
                mutex_lock(&registry, SOURCE, "unsubscribe").remove(&event, id);
                trace!(?event, id, "unsubscribed");
            }
        }))
    }

    /// Deliver `event` to its current subscribers and return how many ran.
    ///
    /// The registry lock is not held while handlers run, so a handler may
    /// publish, subscribe or unsubscribe. A handler removed by an earlier
    /// handler in the same dispatch is skipped.
    pub fn publish(&self, event: E) -> usize {
        let snapshot: Vec<(u64, Handler<E>)> = {
            let registry = mutex_lock(&self.registry, SOURCE, "publish");
            match registry.handlers.get(&event) {
                Some(list) => list.clone(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        for (id, handler) in snapshot {
            let still_registered =
                mutex_lock(&self.registry, SOURCE, "publish.check").contains(&event, id);
            if still_registered {
                handler(&event);
                delivered += 1;
            }
        }
        trace!(?event, delivered, "published");
        delivered
    }

    /// Number of handlers currently registered for `event`.
    pub fn subscriber_count(&self, event: &E) -> usize {
        mutex_lock(&self.registry, SOURCE, "subscriber_count")
            .handlers
            .get(event)
            .map_or(0, Vec::len)
    }
}

/// Handle to one registered handler.
///
/// Dropping it unsubscribes. [`unsubscribe`](Self::unsubscribe) can also be
/// called explicitly and any number of times.
pub struct Subscription {
    release: Mutex<Option<Release>>,
}

impl Subscription {
    fn new(release: Release) -> Self {
        Self {
            release: Mutex::new(Some(release)),
        }
    }

    /// Remove the handler from the bus. Idempotent.
    pub fn unsubscribe(&self) {
        let release = mutex_lock(&self.release, SOURCE, "subscription.take").take();
        if let Some(release) = release {
            release();
        }
    }

    /// Keep the handler registered for as long as the bus lives.
    pub fn detach(self) {
        mutex_lock(&self.release, SOURCE, "subscription.detach").take();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = mutex_lock(&self.release, SOURCE, "subscription.debug").is_some();
        f.debug_struct("Subscription").field("active", &active).finish()
    }
}

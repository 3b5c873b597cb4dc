//! Optimistic add-to-cart with background reconciliation.
//!
//! The local cart in durable storage is updated first and `cart-updated` is
//! published before any network traffic. The remote add then runs on a
//! spawned task; its response replaces the local cart wholesale, while a
//! failure leaves the optimistic cart in place.
//!
//! Overlapping adds are not serialized on the network. Each one does its own
//! read-modify-write of the local cart under an in-process lock, and the last
//! server response to arrive wins. Two processes sharing one durable store
//! can still interleave their writes.

use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use turbo_auth::{AuthGate, Navigator, LOGIN_PATH};
use turbo_cache::{mutex_lock, Storage, StorageExt};
use turbo_events::{EventBus, StoreEvent};

use crate::cart::line::{CartLine, CartLines, CART_ITEMS_KEY};
use crate::catalog::Product;
use crate::error::{ApiError, CartError};
use crate::ids::ProductId;

const SOURCE: &str = "commerce::cart";

/// The remote source of truth for the cart.
#[async_trait]
pub trait CartRemote: Send + Sync {
    /// Add to the server cart and return the cart the server now holds.
    async fn add_item(&self, product: ProductId, quantity: u32) -> Result<Vec<CartLine>, ApiError>;

    /// Fetch the server cart.
    async fn fetch_cart(&self) -> Result<Vec<CartLine>, ApiError>;
}

/// How a background sync ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The server answered and its cart replaced the local one.
    Reconciled { lines: usize },
    /// The remote add failed. The optimistic cart was kept.
    Kept { error: String },
    /// The reconciler was dropped before the response arrived, so the
    /// response was ignored.
    Discarded,
}

/// Progress of one add, as seen from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Pending,
    Settled(SyncOutcome),
}

/// Handle to one optimistic add.
///
/// Dropping it does not cancel the sync.
#[derive(Debug)]
pub struct CartSync {
    optimistic: CartLines,
    persisted: bool,
    outcome: Arc<Mutex<Option<SyncOutcome>>>,
    handle: JoinHandle<SyncOutcome>,
}

impl CartSync {
    /// The cart as computed before the network call.
    ///
    /// When [`persisted`](Self::persisted) is false this list was never
    /// stored: the local cart still holds the previous list and no
    /// `cart-updated` was published for it.
    pub fn optimistic(&self) -> &CartLines {
        &self.optimistic
    }

    /// Whether the optimistic cart reached durable storage.
    pub fn persisted(&self) -> bool {
        self.persisted
    }

    pub fn state(&self) -> SyncState {
        match mutex_lock(&self.outcome, SOURCE, "sync.state").clone() {
            Some(outcome) => SyncState::Settled(outcome),
            None => SyncState::Pending,
        }
    }

    /// Wait for the background sync to finish.
    pub async fn settled(self) -> SyncOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "cart sync task did not complete");
                SyncOutcome::Discarded
            }
        }
    }
}

struct ReconcilerInner {
    storage: Arc<dyn Storage>,
    remote: Arc<dyn CartRemote>,
    auth: AuthGate,
    navigator: Arc<dyn Navigator>,
    bus: EventBus,
    write_guard: Mutex<()>,
}

impl ReconcilerInner {
    fn read_lines(&self) -> CartLines {
        match self.storage.get_json::<serde_json::Value>(CART_ITEMS_KEY) {
            Ok(Some(value)) => CartLines::from_json(value),
            Ok(None) => CartLines::new(),
            Err(e) => {
                warn!(key = CART_ITEMS_KEY, error = %e, "stored cart unreadable, starting empty");
                CartLines::new()
            }
        }
    }

    fn persist(&self, lines: &CartLines) -> bool {
        match self.storage.set_json(CART_ITEMS_KEY, lines) {
            Ok(()) => true,
            Err(e) => {
                warn!(key = CART_ITEMS_KEY, error = %e, "failed to persist cart");
                false
            }
        }
    }

    fn replace(&self, lines: &CartLines) {
        {
            let _guard = mutex_lock(&self.write_guard, SOURCE, "replace");
            if !self.persist(lines) {
                return;
            }
        }
        self.bus.publish(StoreEvent::CartUpdated);
    }
}

/// Owns the local cart and keeps it in step with the server.
///
/// Clones share state. Background syncs hold only a weak reference, so once
/// every clone is dropped late responses are discarded.
#[derive(Clone)]
pub struct CartReconciler {
    inner: Arc<ReconcilerInner>,
}

impl CartReconciler {
    pub fn new(
        storage: Arc<dyn Storage>,
        remote: Arc<dyn CartRemote>,
        auth: AuthGate,
        navigator: Arc<dyn Navigator>,
        bus: EventBus,
    ) -> Self {
        Self {
            inner: Arc::new(ReconcilerInner {
                storage,
                remote,
                auth,
                navigator,
                bus,
                write_guard: Mutex::new(()),
            }),
        }
    }

    /// The local cart.
    pub fn lines(&self) -> CartLines {
        self.inner.read_lines()
    }

    /// Add `quantity` of `product` to the cart.
    ///
    /// Returns once the local cart is written and `cart-updated` has been
    /// published. The remote add continues in the background on the current
    /// Tokio runtime. If the local write fails the remote add still runs,
    /// nothing is published, and [`CartSync::persisted`] reports false.
    pub fn add_to_cart(&self, product: &Product, quantity: u32) -> Result<CartSync, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }
        if !self.inner.auth.is_authenticated() {
            info!(product_id = %product.id, "add to cart while signed out");
            self.inner.navigator.navigate(LOGIN_PATH);
            return Err(CartError::Unauthenticated);
        }
        let runtime = Handle::try_current().map_err(|_| CartError::NoRuntime)?;

        let (optimistic, persisted) = {
            let _guard = mutex_lock(&self.inner.write_guard, SOURCE, "add_to_cart");
            let mut lines = self.inner.read_lines();
            lines.add(product, quantity)?;
            let persisted = self.inner.persist(&lines);
            (lines, persisted)
        };
        if persisted {
            self.inner.bus.publish(StoreEvent::CartUpdated);
            debug!(
                product_id = %product.id,
                quantity,
                lines = optimistic.len(),
                "cart updated optimistically"
            );
        }

        let outcome = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&outcome);
        let weak = Arc::downgrade(&self.inner);
        let remote = Arc::clone(&self.inner.remote);
        let product_id = product.id;
        let handle = runtime.spawn(async move {
            let result = remote.add_item(product_id, quantity).await;
            let settled = settle(&weak, product_id, result);
            *mutex_lock(&slot, SOURCE, "sync.settle") = Some(settled.clone());
            settled
        });

        Ok(CartSync {
            optimistic,
            persisted,
            outcome,
            handle,
        })
    }

    /// Replace the local cart with the server cart.
    pub async fn refresh(&self) -> Result<CartLines, CartError> {
        if !self.inner.auth.is_authenticated() {
            return Err(CartError::Unauthenticated);
        }
        let lines = CartLines::from(self.inner.remote.fetch_cart().await?);
        self.inner.replace(&lines);
        info!(lines = lines.len(), "cart refreshed from server");
        Ok(lines)
    }
}

fn settle(
    weak: &Weak<ReconcilerInner>,
    product_id: ProductId,
    result: Result<Vec<CartLine>, ApiError>,
) -> SyncOutcome {
    let Some(inner) = weak.upgrade() else {
        debug!(%product_id, "cart reconciler gone, discarding response");
        return SyncOutcome::Discarded;
    };

    match result {
        Ok(items) => {
            let lines = CartLines::from(items);
            inner.replace(&lines);
            info!(%product_id, lines = lines.len(), "cart reconciled with server");
            SyncOutcome::Reconciled { lines: lines.len() }
        }
        Err(e) => {
            warn!(%product_id, error = %e, "cart sync failed, keeping local cart");
            SyncOutcome::Kept {
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tokio::sync::Notify;
    use turbo_auth::RecordingNavigator;
    use turbo_cache::MemoryStorage;

    use super::*;

    /// Remote that waits for a go signal, then answers from a script.
    struct GatedRemote {
        gate: Notify,
        reply: Mutex<Option<Result<Vec<CartLine>, ApiError>>>,
        calls: AtomicUsize,
    }

    impl GatedRemote {
        fn new(reply: Result<Vec<CartLine>, ApiError>) -> Arc<Self> {
            Arc::new(Self {
                gate: Notify::new(),
                reply: Mutex::new(Some(reply)),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CartRemote for GatedRemote {
        async fn add_item(&self, _: ProductId, _: u32) -> Result<Vec<CartLine>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            self.reply.lock().unwrap().take().unwrap_or(Ok(Vec::new()))
        }

        async fn fetch_cart(&self) -> Result<Vec<CartLine>, ApiError> {
            Ok(vec![CartLine {
                product_id: ProductId::new(99),
                quantity: 4,
                product: None,
            }])
        }
    }

    struct Fixture {
        storage: Arc<MemoryStorage>,
        navigator: Arc<RecordingNavigator>,
        bus: EventBus,
        events: Arc<AtomicUsize>,
        _sub: turbo_events::Subscription,
    }

    fn fixture(signed_in: bool) -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        if signed_in {
            storage.set("token", "tok").unwrap();
            storage.set("user", r#"{"id": 1}"#).unwrap();
        }
        let bus = EventBus::new();
        let events = Arc::new(AtomicUsize::new(0));
        let counter = events.clone();
        let sub = bus.subscribe(StoreEvent::CartUpdated, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        Fixture {
            storage,
            navigator: Arc::new(RecordingNavigator::new()),
            bus,
            events,
            _sub: sub,
        }
    }

    fn reconciler(f: &Fixture, remote: Arc<dyn CartRemote>) -> CartReconciler {
        CartReconciler::new(
            f.storage.clone(),
            remote,
            AuthGate::new(f.storage.clone()),
            f.navigator.clone(),
            f.bus.clone(),
        )
    }

    fn product(id: u64) -> Product {
        Product::new(ProductId::new(id), "Mug", 8.0)
    }

    #[tokio::test]
    async fn test_optimistic_write_precedes_network() {
        let f = fixture(true);
        let remote = GatedRemote::new(Ok(Vec::new()));
        let cart = reconciler(&f, remote.clone());

        let sync = cart.add_to_cart(&product(7), 1).unwrap();

        assert!(sync.persisted());
        assert_eq!(sync.state(), SyncState::Pending);
        assert_eq!(f.events.load(Ordering::SeqCst), 1);
        assert_eq!(cart.lines().get(ProductId::new(7)).unwrap().quantity, 1);

        remote.gate.notify_one();
        assert_eq!(sync.settled().await, SyncOutcome::Reconciled { lines: 0 });
        assert!(cart.lines().is_empty());
        assert_eq!(f.events.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_server_cart_replaces_local() {
        let f = fixture(true);
        let server = vec![CartLine {
            product_id: ProductId::new(7),
            quantity: 5,
            product: None,
        }];
        let remote = GatedRemote::new(Ok(server));
        let cart = reconciler(&f, remote.clone());

        let sync = cart.add_to_cart(&product(7), 1).unwrap();
        remote.gate.notify_one();
        sync.settled().await;

        assert_eq!(cart.lines().get(ProductId::new(7)).unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_failure_keeps_optimistic_cart() {
        let f = fixture(true);
        let remote = GatedRemote::new(Err(ApiError::Status {
            status: 500,
            message: "down".into(),
        }));
        let cart = reconciler(&f, remote.clone());

        let sync = cart.add_to_cart(&product(3), 2).unwrap();
        remote.gate.notify_one();
        let outcome = sync.settled().await;

        assert!(matches!(outcome, SyncOutcome::Kept { .. }));
        assert_eq!(cart.lines().get(ProductId::new(3)).unwrap().quantity, 2);
        assert_eq!(f.events.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_signed_out_add_redirects_and_writes_nothing() {
        let f = fixture(false);
        let remote = GatedRemote::new(Ok(Vec::new()));
        let cart = reconciler(&f, remote.clone());

        let err = cart.add_to_cart(&product(1), 1).unwrap_err();

        assert!(matches!(err, CartError::Unauthenticated));
        assert_eq!(f.navigator.visits(), vec![LOGIN_PATH.to_string()]);
        assert!(f.storage.get(CART_ITEMS_KEY).unwrap().is_none());
        assert_eq!(f.events.load(Ordering::SeqCst), 0);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_quantity_rejected() {
        let f = fixture(true);
        let cart = reconciler(&f, GatedRemote::new(Ok(Vec::new())));
        assert!(matches!(
            cart.add_to_cart(&product(1), 0),
            Err(CartError::InvalidQuantity(0))
        ));
        assert!(f.storage.get(CART_ITEMS_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_late_response_after_drop_is_discarded() {
        let f = fixture(true);
        let remote = GatedRemote::new(Ok(Vec::new()));
        let cart = reconciler(&f, remote.clone());

        let sync = cart.add_to_cart(&product(7), 1).unwrap();
        drop(cart);
        remote.gate.notify_one();

        assert_eq!(sync.settled().await, SyncOutcome::Discarded);
        let stored = f.storage.get(CART_ITEMS_KEY).unwrap().unwrap();
        assert_eq!(CartLines::from_json(serde_json::from_str(&stored).unwrap()).len(), 1);
        assert_eq!(f.events.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unstored_optimistic_cart_is_reported() {
        let mut f = fixture(false);
        // Room for the credentials but not for a cart line with a snapshot.
        f.storage = Arc::new(MemoryStorage::with_quota(40));
        f.storage.set("token", "tok").unwrap();
        f.storage.set("user", r#"{"id": 1}"#).unwrap();
        let remote = GatedRemote::new(Ok(Vec::new()));
        let cart = reconciler(&f, remote.clone());

        let sync = cart.add_to_cart(&product(7), 1).unwrap();

        assert!(!sync.persisted());
        assert_eq!(sync.optimistic().len(), 1);
        assert!(cart.lines().is_empty());
        assert_eq!(f.events.load(Ordering::SeqCst), 0);

        // The server is still asked, and its answer is stored.
        remote.gate.notify_one();
        assert_eq!(sync.settled().await, SyncOutcome::Reconciled { lines: 0 });
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
        assert_eq!(f.storage.get(CART_ITEMS_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(f.events.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_corrupt_stored_cart_starts_empty() {
        let f = fixture(true);
        f.storage.set(CART_ITEMS_KEY, "{not json").unwrap();
        let remote = GatedRemote::new(Ok(Vec::new()));
        let cart = reconciler(&f, remote.clone());

        let sync = cart.add_to_cart(&product(2), 1).unwrap();
        assert_eq!(sync.optimistic().len(), 1);
        assert_eq!(cart.lines().total_quantity(), 1);
    }

    #[tokio::test]
    async fn test_refresh_replaces_local_cart() {
        let f = fixture(true);
        f.storage
            .set(CART_ITEMS_KEY, &json!([{"product_id": 1, "quantity": 1}]).to_string())
            .unwrap();
        let cart = reconciler(&f, GatedRemote::new(Ok(Vec::new())));

        let lines = cart.refresh().await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(cart.lines().get(ProductId::new(99)).unwrap().quantity, 4);
        assert_eq!(f.events.load(Ordering::SeqCst), 1);
    }
}

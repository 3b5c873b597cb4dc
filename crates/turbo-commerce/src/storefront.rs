//! Wiring of one storefront context.

use std::sync::Arc;
use std::time::Duration;

use turbo_auth::{AuthGate, LoggingNavigator, Navigator, SessionReset};
use turbo_cache::{Clock, MirrorCache, PersistentCache, Storage, SystemClock};
use turbo_data::{FetchClient, Transport};
use turbo_events::{EventBus, Subscription};

use crate::api::{StorefrontApi, DEFAULT_API_BASE};
use crate::badges::BadgeBoard;
use crate::cart::{AddFeedback, CartReconciler, DEFAULT_FEEDBACK_DELAY};
use crate::catalog::{CatalogReaders, CatalogTtls};
use crate::reader::CacheLayers;

/// Builder for [`Storefront`].
pub struct StorefrontBuilder {
    storage: Arc<dyn Storage>,
    transport: Arc<dyn Transport>,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    bus: EventBus,
    base_url: String,
    ttls: CatalogTtls,
    feedback_delay: Duration,
}

impl StorefrontBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Share an existing bus instead of creating one.
    pub fn bus(mut self, bus: EventBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn ttls(mut self, ttls: CatalogTtls) -> Self {
        self.ttls = ttls;
        self
    }

    pub fn feedback_delay(mut self, delay: Duration) -> Self {
        self.feedback_delay = delay;
        self
    }

    pub fn build(self) -> Storefront {
        let auth = AuthGate::new(Arc::clone(&self.storage));
        let reset = Arc::new(SessionReset::new(
            Arc::clone(&self.storage),
            Arc::clone(&self.navigator),
            Arc::clone(&self.clock),
        ));
        let client = FetchClient::from_shared(self.transport).with_base_url(self.base_url);
        let api = StorefrontApi::new(client, auth.clone(), reset);

        let layers = CacheLayers::new(
            Arc::new(MirrorCache::new(Arc::clone(&self.clock))),
            PersistentCache::new(Arc::clone(&self.storage), Arc::clone(&self.clock)),
        );
        let catalog = CatalogReaders::new(api.clone(), layers.clone(), self.ttls);
        let cart = CartReconciler::new(
            Arc::clone(&self.storage),
            Arc::new(api.clone()),
            auth.clone(),
            Arc::clone(&self.navigator),
            self.bus.clone(),
        );
        let badges = BadgeBoard::new(api.clone());

        Storefront {
            bus: self.bus,
            auth,
            api,
            layers,
            catalog,
            cart,
            badges,
            feedback_delay: self.feedback_delay,
        }
    }
}

/// Everything one storefront session needs, constructed once and passed by
/// reference. Nothing here is global.
pub struct Storefront {
    bus: EventBus,
    auth: AuthGate,
    api: StorefrontApi,
    layers: CacheLayers,
    catalog: CatalogReaders,
    cart: CartReconciler,
    badges: Arc<BadgeBoard>,
    feedback_delay: Duration,
}

impl Storefront {
    /// Start building a storefront over `storage` and `transport`.
    pub fn builder(storage: Arc<dyn Storage>, transport: Arc<dyn Transport>) -> StorefrontBuilder {
        StorefrontBuilder {
            storage,
            transport,
            navigator: Arc::new(LoggingNavigator),
            clock: Arc::new(SystemClock),
            bus: EventBus::new(),
            base_url: DEFAULT_API_BASE.to_string(),
            ttls: CatalogTtls::default(),
            feedback_delay: DEFAULT_FEEDBACK_DELAY,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn auth(&self) -> &AuthGate {
        &self.auth
    }

    pub fn api(&self) -> &StorefrontApi {
        &self.api
    }

    pub fn caches(&self) -> &CacheLayers {
        &self.layers
    }

    pub fn catalog(&self) -> &CatalogReaders {
        &self.catalog
    }

    pub fn cart(&self) -> &CartReconciler {
        &self.cart
    }

    pub fn badges(&self) -> &Arc<BadgeBoard> {
        &self.badges
    }

    /// Keep the badges refreshed on cart and order events.
    pub fn watch_badges(&self) -> Vec<Subscription> {
        self.badges.watch(&self.bus)
    }

    /// A fresh indicator for one add-to-cart control.
    pub fn add_feedback(&self) -> AddFeedback {
        AddFeedback::new(self.feedback_delay)
    }
}

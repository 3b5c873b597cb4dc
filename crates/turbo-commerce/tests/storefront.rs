//! End-to-end behaviour of a storefront over an in-memory transport.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use turbo_auth::{RecordingNavigator, LOGIN_PATH};
use turbo_cache::{CacheEntry, FileStorage, ManualClock, MemoryStorage, Storage, StorageExt};
use turbo_commerce::cart::CART_ITEMS_KEY;
use turbo_commerce::catalog::{BANNERS_KEY, FOOTER_KEY};
use turbo_commerce::prelude::*;
use turbo_data::mock::MockTransport;
use turbo_data::Method;
use turbo_events::StoreEvent;

const START_MS: i64 = 1_700_000_000_000;
const HOUR: Duration = Duration::from_secs(3600);

struct Harness {
    store: Storefront,
    mock: Arc<MockTransport>,
    storage: Arc<MemoryStorage>,
    clock: Arc<ManualClock>,
    navigator: Arc<RecordingNavigator>,
}

fn harness() -> Harness {
    let mock = Arc::new(MockTransport::new());
    let storage = Arc::new(MemoryStorage::new());
    let clock = Arc::new(ManualClock::new(START_MS));
    let navigator = Arc::new(RecordingNavigator::new());
    let store = Storefront::builder(storage.clone(), mock.clone())
        .base_url("http://mock")
        .clock(clock.clone())
        .navigator(navigator.clone())
        .build();
    Harness {
        store,
        mock,
        storage,
        clock,
        navigator,
    }
}

fn sign_in(h: &Harness) {
    let user = json!({"id": 42, "name": "Ada"}).as_object().cloned().unwrap();
    h.store.auth().sign_in("secret-token", user).unwrap();
}

fn product(id: u64) -> Product {
    Product::new(ProductId::new(id), format!("Product {id}"), 12.5)
}

fn count_events(h: &Harness, event: StoreEvent) -> (Arc<AtomicUsize>, turbo_events::Subscription) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let sub = h.store.bus().subscribe(event, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    (hits, sub)
}

#[tokio::test]
async fn test_reader_ttl_boundary() {
    let h = harness();
    h.mock
        .respond(Method::Get, "/banners", 200, json!([{"id": 1, "image": "a.png", "type": "main"}]));

    let first = h.store.catalog().banners().await.unwrap();
    assert_eq!(first.len(), 1);

    h.clock.advance(12 * HOUR - Duration::from_millis(1));
    h.store.catalog().banners().await.unwrap();
    assert_eq!(h.mock.count(Method::Get, "/banners"), 1);

    h.clock.advance(Duration::from_millis(1));
    h.store.catalog().banners().await.unwrap();
    assert_eq!(h.mock.count(Method::Get, "/banners"), 2);
}

#[tokio::test]
async fn test_refetch_rewrites_timestamp_not_value() {
    let h = harness();
    h.mock.respond(Method::Get, "/categories", 200, json!([{"id": 1, "name": "Home"}]));

    h.store.catalog().home_categories().await.unwrap();
    let before: CacheEntry<serde_json::Value> = h
        .storage
        .get_json("vipuri_home_categories_v1")
        .unwrap()
        .unwrap();

    h.clock.advance(13 * HOUR);
    h.store.catalog().home_categories().await.unwrap();
    let after: CacheEntry<serde_json::Value> = h
        .storage
        .get_json("vipuri_home_categories_v1")
        .unwrap()
        .unwrap();

    assert_eq!(before.value, after.value);
    assert_eq!(after.ttl_ms, before.ttl_ms);
    assert_eq!(
        after.stored_at_epoch_ms - before.stored_at_epoch_ms,
        13 * 3600 * 1000
    );
}

#[tokio::test]
async fn test_malformed_list_payload_is_empty() {
    let h = harness();
    h.mock.respond(Method::Get, "/banners", 200, json!({}));

    let banners = h.store.catalog().banners().await.unwrap();
    assert!(banners.is_empty());

    let stored: CacheEntry<Vec<Banner>> = h.storage.get_json(BANNERS_KEY).unwrap().unwrap();
    assert!(stored.value.is_empty());
}

#[tokio::test]
async fn test_failed_fetch_propagates_and_caches_nothing() {
    let h = harness();
    h.mock.respond(Method::Get, "/banners", 503, json!({"error": "down"}));

    let err = h.store.catalog().banners().await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 503, .. }));
    assert!(h.storage.get(BANNERS_KEY).unwrap().is_none());
    assert!(h.store.caches().mirror().is_empty());
}

#[tokio::test]
async fn test_sub_keyed_readers_are_independent() {
    let h = harness();
    h.mock.respond(
        Method::Get,
        "/categories/1/subcategories",
        200,
        json!({"data": [{"id": 10, "name": "Sofas"}]}),
    );
    h.mock.respond(
        Method::Get,
        "/categories/2/subcategories",
        200,
        json!([{"id": 20, "name": "Pans"}, {"id": 21, "name": "Pots"}]),
    );

    let one = h.store.catalog().subcategories(CategoryId::new(1)).await.unwrap();
    let two = h.store.catalog().subcategories(CategoryId::new(2)).await.unwrap();
    h.store.catalog().subcategories(CategoryId::new(1)).await.unwrap();

    assert_eq!(one.len(), 1);
    assert_eq!(two.len(), 2);
    assert_eq!(h.mock.count(Method::Get, "/categories/1/subcategories"), 1);
    assert!(h.storage.exists("subcategories_v1:1").unwrap());
    assert!(h.storage.exists("subcategories_v1:2").unwrap());
}

#[tokio::test]
async fn test_footer_survives_failing_column() {
    let h = harness();
    h.mock.respond(
        Method::Get,
        "/categories",
        200,
        json!([{"id": 1, "name": "Home"}, {"id": 2, "name": "Garden"}]),
    );
    h.mock.respond(
        Method::Get,
        "/categories/1/subcategories",
        200,
        json!([{"id": 10, "name": "Sofas"}]),
    );
    h.mock
        .respond(Method::Get, "/categories/2/subcategories", 500, json!({}));

    let footer = h.store.catalog().footer().await.unwrap();

    assert_eq!(footer.categories.len(), 2);
    assert_eq!(footer.column(CategoryId::new(1)).len(), 1);
    assert!(footer.column(CategoryId::new(2)).is_empty());
    assert!(h.storage.exists(FOOTER_KEY).unwrap());

    h.clock.advance(Duration::from_secs(10 * 60));
    h.store.catalog().footer().await.unwrap();
    assert_eq!(h.mock.count(Method::Get, "/categories"), 2);
}

#[tokio::test]
async fn test_requests_carry_accept_and_bearer() {
    let h = harness();
    h.mock.respond(Method::Get, "/banners", 200, json!([]));
    h.store.catalog().banners().await.unwrap();

    sign_in(&h);
    h.mock.respond(Method::Get, "/orders/count", 200, json!({"count": 3}));
    assert_eq!(h.store.api().count_orders().await.unwrap(), 3);

    let requests = h.mock.requests();
    assert_eq!(requests[0].header_value("Accept"), Some("application/json"));
    assert_eq!(requests[0].header_value("Authorization"), None);
    assert_eq!(
        requests[1].header_value("Authorization"),
        Some("Bearer secret-token")
    );
}

#[tokio::test]
async fn test_repeat_add_merges_quantity() {
    let h = harness();
    sign_in(&h);
    h.mock.respond(Method::Post, "/cart/add", 500, json!({"error": "busy"}));

    for _ in 0..2 {
        let outcome = h.store.cart().add_to_cart(&product(7), 1).unwrap().settled().await;
        assert!(matches!(outcome, SyncOutcome::Kept { .. }));
    }

    let lines = h.store.cart().lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines.get(ProductId::new(7)).unwrap().quantity, 2);
}

#[tokio::test(start_paused = true)]
async fn test_optimistic_update_visible_before_network() {
    let h = harness();
    sign_in(&h);
    h.mock.set_delay(Duration::from_secs(2));
    h.mock.respond(
        Method::Post,
        "/cart/add",
        200,
        json!({"cart": {"items": [{"product_id": 7, "quantity": 3}]}}),
    );
    let (events, _sub) = count_events(&h, StoreEvent::CartUpdated);

    let sync = h.store.cart().add_to_cart(&product(7), 1).unwrap();

    assert_eq!(events.load(Ordering::SeqCst), 1);
    assert_eq!(sync.state(), SyncState::Pending);
    let stored: serde_json::Value = h.storage.get_json(CART_ITEMS_KEY).unwrap().unwrap();
    assert_eq!(stored[0]["product_id"], 7);
    assert_eq!(stored[0]["quantity"], 1);
    assert_eq!(stored[0]["product"]["name"], "Product 7");

    let outcome = sync.settled().await;
    assert_eq!(outcome, SyncOutcome::Reconciled { lines: 1 });
    assert_eq!(events.load(Ordering::SeqCst), 2);
    assert_eq!(h.store.cart().lines().get(ProductId::new(7)).unwrap().quantity, 3);

    let body: serde_json::Value =
        serde_json::from_slice(h.mock.requests()[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(body, json!({"product_id": 7, "quantity": 1}));
}

fn cart_ids(h: &Harness) -> Vec<u64> {
    h.store.cart().lines().iter().map(|line| line.product_id.get()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_adds_last_response_wins() {
    let h = harness();
    sign_in(&h);
    h.mock.respond_once_after(
        Method::Post,
        "/cart/add",
        Duration::from_millis(200),
        200,
        json!({"items": [{"product_id": 1, "quantity": 1}]}),
    );
    h.mock.respond_once_after(
        Method::Post,
        "/cart/add",
        Duration::from_millis(50),
        200,
        json!({"items": [{"product_id": 2, "quantity": 1}]}),
    );

    let first = h.store.cart().add_to_cart(&product(1), 1).unwrap();
    while h.mock.requests().is_empty() {
        tokio::task::yield_now().await;
    }
    let second = h.store.cart().add_to_cart(&product(2), 1).unwrap();
    assert_eq!(second.optimistic().len(), 2);

    assert_eq!(second.settled().await, SyncOutcome::Reconciled { lines: 1 });
    assert_eq!(cart_ids(&h), vec![2]);

    // The first request's response arrives last and replaces the cart.
    assert_eq!(first.settled().await, SyncOutcome::Reconciled { lines: 1 });
    assert_eq!(cart_ids(&h), vec![1]);

    let body: serde_json::Value =
        serde_json::from_slice(h.mock.requests()[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(body["product_id"], 1);
}

#[tokio::test]
async fn test_listed_product_becomes_cart_snapshot() {
    let h = harness();
    h.mock.respond(
        Method::Get,
        "/subcategories/4/products",
        200,
        json!({"products": [{
            "id": "9",
            "name": "Clutch kit",
            "new_price": "250000.00",
            "old_price": "300000.00",
            "images": ["products/clutch.jpg"],
            "attribute_values": [{"value": "Toyota"}]
        }]}),
    );

    let products = h.store.api().subcategory_products(SubcategoryId::new(4)).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, ProductId::new(9));
    assert_eq!(products[0].discount_percent(), 17);

    // Listings are always fetched live.
    h.store.api().subcategory_products(SubcategoryId::new(4)).await.unwrap();
    assert_eq!(h.mock.count(Method::Get, "/subcategories/4/products"), 2);

    sign_in(&h);
    h.mock.respond(Method::Post, "/cart/add", 503, json!({}));
    h.store.cart().add_to_cart(&products[0], 1).unwrap().settled().await;

    let stored: serde_json::Value = h.storage.get_json(CART_ITEMS_KEY).unwrap().unwrap();
    assert_eq!(stored[0]["product"]["name"], "Clutch kit");
    assert_eq!(stored[0]["product"]["image"], "products/clutch.jpg");
    assert_eq!(stored[0]["product"]["oldPrice"], 300000.0);
}

#[tokio::test]
async fn test_empty_user_record_is_signed_out() {
    let h = harness();
    h.storage.set("token", "t").unwrap();
    h.storage.set("user", "{}").unwrap();

    assert!(!h.store.auth().is_authenticated());
    let err = h.store.cart().add_to_cart(&product(1), 1).unwrap_err();

    assert!(matches!(err, CartError::Unauthenticated));
    assert_eq!(h.navigator.visits(), vec![LOGIN_PATH.to_string()]);
    assert!(h.mock.requests().is_empty());
    assert!(!h.storage.exists(CART_ITEMS_KEY).unwrap());
}

#[tokio::test]
async fn test_unauthorized_resets_session_once() {
    let h = harness();
    sign_in(&h);
    h.mock.respond(Method::Get, "/orders/count", 401, json!({"message": "expired"}));
    h.mock.respond(Method::Get, "/cart", 401, json!({"message": "expired"}));

    let first = h.store.api().count_orders().await.unwrap_err();
    let second = h.store.api().cart().await.unwrap_err();

    assert!(first.is_unauthorized());
    assert!(second.is_unauthorized());
    for key in ["token", "user", "userId"] {
        assert!(!h.storage.exists(key).unwrap(), "{key} should be cleared");
    }
    assert_eq!(h.navigator.visits(), vec![LOGIN_PATH.to_string()]);
    assert!(!h.store.auth().is_authenticated());
}

#[tokio::test]
async fn test_unauthorized_during_sync_keeps_local_cart() {
    let h = harness();
    sign_in(&h);
    h.mock.respond(Method::Post, "/cart/add", 401, json!({}));

    let outcome = h.store.cart().add_to_cart(&product(5), 2).unwrap().settled().await;

    assert_eq!(
        outcome,
        SyncOutcome::Kept {
            error: "Unauthorized".to_string()
        }
    );
    assert_eq!(h.store.cart().lines().total_quantity(), 2);
    assert_eq!(h.navigator.visits(), vec![LOGIN_PATH.to_string()]);
}

#[tokio::test]
async fn test_badge_counts_settle_independently() {
    let h = harness();
    sign_in(&h);
    h.mock.respond(
        Method::Get,
        "/messages/count-unread-messages/42",
        200,
        json!({"count": 4}),
    );
    h.mock.respond(Method::Get, "/orders/count", 500, json!({}));
    h.mock.respond(
        Method::Get,
        "/cart",
        200,
        json!({"items": [{"product_id": 1, "quantity": 1}, {"product_id": 2, "quantity": 5}]}),
    );

    let counts = h.store.badges().refresh().await;
    assert_eq!(
        counts,
        BadgeCounts {
            unread_messages: 4,
            orders: 0,
            cart_lines: 2
        }
    );
}

#[tokio::test]
async fn test_badges_skip_when_signed_out() {
    let h = harness();
    let counts = h.store.badges().refresh().await;
    assert_eq!(counts, BadgeCounts::default());
    assert!(h.mock.requests().is_empty());
}

#[tokio::test]
async fn test_badge_watch_and_unsubscribe() {
    let h = harness();
    sign_in(&h);
    h.mock.respond(Method::Get, "/orders/count", 200, json!({"count": 1}));

    let subs = h.store.watch_badges();
    assert_eq!(h.store.bus().subscriber_count(&StoreEvent::OrdersUpdated), 1);

    h.store.bus().publish(StoreEvent::OrdersUpdated);
    for _ in 0..10 {
        if h.store.badges().counts().orders == 1 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(h.store.badges().counts().orders, 1);

    for sub in &subs {
        sub.unsubscribe();
        sub.unsubscribe();
    }
    let before = h.mock.requests().len();
    assert_eq!(h.store.bus().publish(StoreEvent::OrdersUpdated), 0);
    tokio::task::yield_now().await;
    assert_eq!(h.mock.requests().len(), before);
}

#[tokio::test]
async fn test_file_storage_serves_cache_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let origin = "https://shop.example";
    let clock = Arc::new(ManualClock::new(START_MS));

    let first_mock = Arc::new(MockTransport::new());
    first_mock.respond(Method::Get, "/banners", 200, json!([{"id": 3, "image": "x.png"}]));
    {
        let storage = Arc::new(FileStorage::for_origin(dir.path(), origin).unwrap());
        let store = Storefront::builder(storage, first_mock.clone())
            .base_url("http://mock")
            .clock(clock.clone())
            .build();
        store.catalog().banners().await.unwrap();
    }

    let second_mock = Arc::new(MockTransport::new());
    let storage = Arc::new(FileStorage::for_origin(dir.path(), origin).unwrap());
    let store = Storefront::builder(storage, second_mock.clone())
        .base_url("http://mock")
        .clock(clock)
        .build();
    let banners = store.catalog().banners().await.unwrap();

    assert_eq!(banners[0].id, BannerId::new(3));
    assert!(second_mock.requests().is_empty());
}

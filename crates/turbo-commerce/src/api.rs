//! Typed calls against the storefront REST API.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};
use turbo_auth::{AuthGate, SessionReset};
use turbo_data::{ClientRequestBuilder, FetchClient};

use crate::cart::{CartLine, CartRemote};
use crate::catalog::{Attribute, Banner, Category, Product, ProductRecord, Subcategory};
use crate::error::ApiError;
use crate::ids::{CategoryId, ProductId, SubcategoryId};
use crate::reader::lenient_list;

/// Backend used when nothing else is configured.
pub const DEFAULT_API_BASE: &str = "https://api.vipuri.co.tz/api";

/// Client for the storefront backend.
///
/// Every request carries `Accept: application/json` and, when a token is
/// stored, a bearer `Authorization` header. A 401 from any endpoint triggers
/// the [`SessionReset`] before the error is returned.
#[derive(Clone)]
pub struct StorefrontApi {
    client: FetchClient,
    auth: AuthGate,
    reset: Arc<SessionReset>,
}

impl StorefrontApi {
    pub fn new(client: FetchClient, auth: AuthGate, reset: Arc<SessionReset>) -> Self {
        let client = client.with_default_header("Accept", "application/json");
        Self {
            client,
            auth,
            reset,
        }
    }

    async fn execute(&self, builder: ClientRequestBuilder) -> Result<Value, ApiError> {
        let builder = match self.auth.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        let method = builder.request().method;
        let path = builder.request().path().to_string();

        let response = builder.send().await.map_err(|e| {
            warn!(%method, %path, transient = e.is_transient(), error = %e, "request did not complete");
            ApiError::from(e)
        })?;
        if response.is_unauthorized() {
            warn!(%method, %path, "request rejected with 401");
            self.reset.handle_unauthorized();
            return Err(ApiError::Unauthorized);
        }
        if !response.is_success() {
            let message = response.text().unwrap_or_default();
            warn!(%method, %path, status = response.status, "API request failed");
            return Err(ApiError::Status {
                status: response.status,
                message,
            });
        }

        debug!(%method, %path, status = response.status, "API request succeeded");
        response
            .json::<Value>()
            .map_err(|e| ApiError::InvalidBody(e.to_string()))
    }

    /// GET `path` and return the decoded JSON body.
    pub async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        self.execute(self.client.get(path)).await
    }

    /// POST `body` as JSON to `path` and return the decoded JSON body.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let builder = self.client.post(path).json(body)?;
        self.execute(builder).await
    }

    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get_json("/categories").await.map(lenient_list)
    }

    pub async fn categories_with_subcategories(&self) -> Result<Vec<Category>, ApiError> {
        self.get_json("/categories-with-subcategories")
            .await
            .map(lenient_list)
    }

    pub async fn subcategories(&self, category: CategoryId) -> Result<Vec<Subcategory>, ApiError> {
        self.get_json(&format!("/categories/{category}/subcategories"))
            .await
            .map(lenient_list)
    }

    pub async fn attributes(&self, subcategory: SubcategoryId) -> Result<Vec<Attribute>, ApiError> {
        self.get_json(&format!("/subcategories/{subcategory}/attributes-with-options"))
            .await
            .map(lenient_list)
    }

    /// Products listed under a subcategory. Not cached: prices and stock
    /// move faster than any listing TTL.
    pub async fn subcategory_products(
        &self,
        subcategory: SubcategoryId,
    ) -> Result<Vec<Product>, ApiError> {
        self.get_json(&format!("/subcategories/{subcategory}/products"))
            .await
            .map(products_from)
    }

    pub async fn banners(&self) -> Result<Vec<Banner>, ApiError> {
        self.get_json("/banners").await.map(lenient_list)
    }

    /// The server-side cart.
    pub async fn cart(&self) -> Result<Vec<CartLine>, ApiError> {
        self.get_json("/cart").await.map(cart_items_from)
    }

    /// Add `quantity` of `product` to the server-side cart and return the
    /// cart the server reports back.
    pub async fn add_to_cart(
        &self,
        product: ProductId,
        quantity: u32,
    ) -> Result<Vec<CartLine>, ApiError> {
        let body = serde_json::json!({ "product_id": product, "quantity": quantity });
        self.post_json("/cart/add", &body).await.map(cart_items_from)
    }

    pub async fn count_unread_messages(&self, user_id: &str) -> Result<u64, ApiError> {
        self.get_json(&format!("/messages/count-unread-messages/{user_id}"))
            .await
            .map(|body| count_from(&body))
    }

    pub async fn count_orders(&self) -> Result<u64, ApiError> {
        self.get_json("/orders/count").await.map(|body| count_from(&body))
    }

    pub fn auth(&self) -> &AuthGate {
        &self.auth
    }
}

#[async_trait]
impl CartRemote for StorefrontApi {
    async fn add_item(&self, product: ProductId, quantity: u32) -> Result<Vec<CartLine>, ApiError> {
        self.add_to_cart(product, quantity).await
    }

    async fn fetch_cart(&self) -> Result<Vec<CartLine>, ApiError> {
        self.cart().await
    }
}

/// Cart lines from a cart response: `items`, else `cart.items`, else none.
pub fn cart_items_from(body: Value) -> Vec<CartLine> {
    let items = match body {
        Value::Object(mut map) => match map.remove("items") {
            Some(items) if !items.is_null() => items,
            _ => map
                .remove("cart")
                .and_then(|mut cart| cart.get_mut("items").map(Value::take))
                .unwrap_or(Value::Null),
        },
        _ => Value::Null,
    };
    lenient_list(items)
}

/// Products from a product listing: `products`, else a bare or `data` list.
pub fn products_from(body: Value) -> Vec<Product> {
    let list = match body {
        Value::Object(mut map) if map.contains_key("products") => {
            map.remove("products").unwrap_or(Value::Null)
        }
        other => other,
    };
    lenient_list::<ProductRecord>(list)
        .into_iter()
        .map(Product::from)
        .collect()
}

/// The `count` field of a count response, 0 when absent or not a number.
pub fn count_from(body: &Value) -> u64 {
    body.get("count")
        .and_then(|c| c.as_u64().or_else(|| c.as_str()?.trim().parse().ok()))
        .unwrap_or(0)
}

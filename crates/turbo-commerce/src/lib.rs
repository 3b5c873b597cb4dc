//! Storefront domain logic for TurboCommerce.
//!
//! This crate ties the cache, event, auth and HTTP crates into the pieces a
//! storefront client needs:
//!
//! - **Catalog**: category, banner, footer and attribute listings served
//!   through a mirror cache and a persistent TTL cache
//! - **Cart**: an optimistic add-to-cart that is visible immediately and is
//!   reconciled with the server in the background
//! - **Badges**: header counts refreshed on cart and order events
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use turbo_cache::FileStorage;
//! use turbo_commerce::prelude::*;
//! use turbo_data::ReqwestTransport;
//!
//! let storage = Arc::new(FileStorage::for_origin(".storefront", "https://shop.example")?);
//! let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(10))?);
//! let store = Storefront::builder(storage, transport)
//!     .base_url("https://api.example.com/api")
//!     .build();
//!
//! let categories = store.catalog().nav_categories().await?;
//! let sync = store.cart().add_to_cart(&product, 1)?;   // visible now
//! let outcome = sync.settled().await;                  // server answered
//! ```

pub mod api;
pub mod badges;
pub mod cart;
pub mod catalog;
mod de;
pub mod error;
pub mod ids;
pub mod reader;
pub mod storefront;

pub use error::{ApiError, CartError};
pub use ids::*;
pub use storefront::{Storefront, StorefrontBuilder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{ApiError, CartError};
    pub use crate::ids::*;
    pub use crate::storefront::Storefront;

    pub use crate::api::StorefrontApi;
    pub use crate::badges::{BadgeBoard, BadgeCounts};

    // Catalog
    pub use crate::catalog::{
        Attribute, AttributeOption, Banner, BannerPlacement, CatalogReaders, CatalogTtls,
        Category, FooterTaxonomy, Product, Subcategory,
    };

    // Cart
    pub use crate::cart::{
        AddFeedback, CartLine, CartLines, CartReconciler, CartSync, FeedbackState, SyncOutcome,
        SyncState,
    };
}

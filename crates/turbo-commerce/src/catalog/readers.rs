//! Cached readers for every catalog listing the storefront shows.

use std::collections::BTreeMap;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, warn};
use turbo_cache::cache_key;

use crate::api::StorefrontApi;
use crate::catalog::{Attribute, Banner, Category, FooterTaxonomy, Subcategory};
use crate::error::ApiError;
use crate::ids::{CategoryId, SubcategoryId};
use crate::reader::{CacheLayers, CachedReader};

pub const NAV_CATEGORIES_KEY: &str = "d2k_categories_cache_v1";
pub const HOME_CATEGORIES_KEY: &str = "vipuri_home_categories_v1";
pub const BANNERS_KEY: &str = "vipuri_banners_v4";
pub const FOOTER_KEY: &str = "d2k_footer_cache_v1";
pub const SUBCATEGORIES_PREFIX: &str = "subcategories_v1";
pub const ATTRIBUTES_PREFIX: &str = "subcategory_attributes_v1";

const HOUR: Duration = Duration::from_secs(60 * 60);

/// Time-to-live of each catalog listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogTtls {
    pub categories: Duration,
    pub home_categories: Duration,
    pub banners: Duration,
    pub footer: Duration,
    pub subcategories: Duration,
    pub attributes: Duration,
}

impl Default for CatalogTtls {
    fn default() -> Self {
        Self {
            categories: 24 * HOUR,
            home_categories: 12 * HOUR,
            banners: 12 * HOUR,
            footer: Duration::from_secs(10 * 60),
            subcategories: 12 * HOUR,
            attributes: 12 * HOUR,
        }
    }
}

/// Catalog listings, each served from cache while fresh.
#[derive(Clone)]
pub struct CatalogReaders {
    api: StorefrontApi,
    layers: CacheLayers,
    ttls: CatalogTtls,
}

impl CatalogReaders {
    pub fn new(api: StorefrontApi, layers: CacheLayers, ttls: CatalogTtls) -> Self {
        Self { api, layers, ttls }
    }

    pub fn ttls(&self) -> &CatalogTtls {
        &self.ttls
    }

    fn reader<T>(&self, key: impl Into<String>, ttl: Duration) -> CachedReader<T>
    where
        T: serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync + 'static,
    {
        CachedReader::new(self.layers.clone(), key, ttl)
    }

    /// Categories with their subcategories, for the navigation bar.
    pub async fn nav_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.reader(NAV_CATEGORIES_KEY, self.ttls.categories)
            .load(|| self.api.categories_with_subcategories())
            .await
    }

    /// Flat category list for the home page.
    pub async fn home_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.reader(HOME_CATEGORIES_KEY, self.ttls.home_categories)
            .load(|| self.api.categories())
            .await
    }

    pub async fn banners(&self) -> Result<Vec<Banner>, ApiError> {
        self.reader(BANNERS_KEY, self.ttls.banners)
            .load(|| self.api.banners())
            .await
    }

    pub async fn subcategories(&self, category: CategoryId) -> Result<Vec<Subcategory>, ApiError> {
        self.reader(cache_key!(SUBCATEGORIES_PREFIX, category), self.ttls.subcategories)
            .load(|| self.api.subcategories(category))
            .await
    }

    pub async fn attributes(&self, subcategory: SubcategoryId) -> Result<Vec<Attribute>, ApiError> {
        self.reader(cache_key!(ATTRIBUTES_PREFIX, subcategory), self.ttls.attributes)
            .load(|| self.api.attributes(subcategory))
            .await
    }

    /// Categories and every category's subcategories, for the footer.
    ///
    /// Subcategory lists are fetched concurrently. A category whose list
    /// fails to load gets an empty column instead of failing the footer.
    pub async fn footer(&self) -> Result<FooterTaxonomy, ApiError> {
        self.reader(FOOTER_KEY, self.ttls.footer)
            .load(|| self.fetch_footer())
            .await
    }

    async fn fetch_footer(&self) -> Result<FooterTaxonomy, ApiError> {
        let categories = self.api.categories().await?;
        let columns = join_all(categories.iter().map(|category| async move {
            let subcategories = match self.api.subcategories(category.id).await {
                Ok(list) => list,
                Err(e) => {
                    warn!(category_id = %category.id, error = %e, "footer column failed to load");
                    Vec::new()
                }
            };
            (category.id, subcategories)
        }))
        .await;

        let subcategories: BTreeMap<CategoryId, Vec<Subcategory>> = columns.into_iter().collect();
        debug!(categories = categories.len(), "footer taxonomy fetched");
        Ok(FooterTaxonomy {
            categories,
            subcategories,
        })
    }
}

//! Product catalog module.
//!
//! Contains the listing types the storefront shows and the cached readers
//! that load them.

mod banner;
mod category;
mod product;
mod readers;

pub use banner::{Banner, BannerPlacement};
pub use category::{Attribute, AttributeOption, Category, FooterTaxonomy, Subcategory};
pub use product::{image_url, Product, ProductRecord, PLACEHOLDER_IMAGE};
pub use readers::{
    CatalogReaders, CatalogTtls, ATTRIBUTES_PREFIX, BANNERS_KEY, FOOTER_KEY, HOME_CATEGORIES_KEY,
    NAV_CATEGORIES_KEY, SUBCATEGORIES_PREFIX,
};

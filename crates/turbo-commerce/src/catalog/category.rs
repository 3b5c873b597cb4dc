//! Category taxonomy types.

use std::collections::BTreeMap;

use crate::ids::{AttributeId, AttributeOptionId, CategoryId, SubcategoryId};
use serde::{Deserialize, Serialize};

/// A top-level category.
///
/// `subcategories` is only filled by the navigation endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub subcategories: Vec<Subcategory>,
}

/// A subcategory under a [`Category`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subcategory {
    pub id: SubcategoryId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_image_url: Option<String>,
}

/// A filterable attribute of a subcategory, e.g. "Color".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attribute {
    pub id: AttributeId,
    pub name: String,
    pub options: Vec<AttributeOption>,
}

/// One selectable value of an [`Attribute`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeOption {
    pub id: AttributeOptionId,
    pub value: String,
}

/// Categories and their subcategories, as the footer lays them out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FooterTaxonomy {
    pub categories: Vec<Category>,
    pub subcategories: BTreeMap<CategoryId, Vec<Subcategory>>,
}

impl FooterTaxonomy {
    /// Subcategories listed under `category`, empty if none were loaded.
    pub fn column(&self, category: CategoryId) -> &[Subcategory] {
        self.subcategories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

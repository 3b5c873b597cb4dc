//! Product snapshot as the storefront lists it.

use crate::de;
use crate::ids::ProductId;
use serde::{Deserialize, Serialize};

/// Image shown when a record has no image path.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.png";

/// A product as returned by listing endpoints.
///
/// Cart lines embed a copy of this record, so it must round-trip through
/// durable storage unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub image: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
}

impl Product {
    /// Create a product with just the fields the cart needs.
    pub fn new(id: ProductId, name: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            ..Self::default()
        }
    }

    /// Check if the product is marked down.
    pub fn is_on_sale(&self) -> bool {
        self.old_price.is_some_and(|old| old > self.price)
    }

    /// Whole-percent markdown from the old price, 0 when not on sale.
    pub fn discount_percent(&self) -> u32 {
        match self.old_price {
            Some(old) if old > self.price && old > 0.0 => {
                (((old - self.price) / old) * 100.0).round() as u32
            }
            _ => 0,
        }
    }
}

/// A product as the backend lists it under `/subcategories/{id}/products`.
///
/// Decode it, then convert it into a [`Product`].
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRecord {
    id: ProductId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default, deserialize_with = "de::f64_lenient")]
    new_price: f64,
    #[serde(default, deserialize_with = "de::opt_f64_lenient")]
    old_price: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64_lenient")]
    average_rating: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_u64_lenient")]
    review_count: Option<u64>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    attribute_values: Option<Vec<AttributeValue>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AttributeValue {
    value: String,
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        let image = record
            .images
            .into_iter()
            .flatten()
            .find(|path| !path.trim().is_empty())
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());
        Self {
            id: record.id,
            name: record.name,
            image,
            price: record.new_price,
            old_price: record.old_price,
            rating: record.average_rating,
            reviews: record.review_count,
            description: record.description.filter(|d| !d.trim().is_empty()),
            attributes: record
                .attribute_values
                .into_iter()
                .flatten()
                .map(|a| a.value)
                .filter(|v| !v.is_empty())
                .collect(),
        }
    }
}

/// Resolve a stored image path against the storage base URL.
///
/// Absolute `http(s)` paths are returned unchanged and a missing path yields
/// [`PLACEHOLDER_IMAGE`].
pub fn image_url(path: Option<&str>, storage_base: Option<&str>) -> String {
    let path = match path.map(str::trim) {
        Some(p) if !p.is_empty() => p,
        _ => return PLACEHOLDER_IMAGE.to_string(),
    };
    if path.starts_with("http") {
        return path.to_string();
    }
    match storage_base {
        Some(base) if !base.is_empty() => {
            format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
        }
        _ => {
            tracing::warn!(path, "no storage base URL configured for relative image path");
            path.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_percent() {
        let mut product = Product::new(ProductId::new(1), "Kettle", 75.0);
        assert_eq!(product.discount_percent(), 0);

        product.old_price = Some(100.0);
        assert!(product.is_on_sale());
        assert_eq!(product.discount_percent(), 25);

        product.old_price = Some(60.0);
        assert_eq!(product.discount_percent(), 0);

        product.price = 2.0;
        product.old_price = Some(3.0);
        assert_eq!(product.discount_percent(), 33);
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": 7,
            "name": "Lamp",
            "price": 10.5,
            "oldPrice": 12.0,
            "unknownField": true
        }))
        .unwrap();
        assert_eq!(product.old_price, Some(12.0));
        assert!(product.image.is_empty());

        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["oldPrice"], 12.0);
        assert!(value.get("rating").is_none());
    }

    #[test]
    fn test_backend_record_maps_to_card() {
        let record: ProductRecord = serde_json::from_value(serde_json::json!({
            "id": 12,
            "name": "Brake pad set",
            "images": ["products/pad.jpg", "products/pad-2.jpg"],
            "new_price": "45000.00",
            "old_price": 52000,
            "average_rating": "4.5",
            "review_count": 8,
            "description": "Front axle",
            "attribute_values": [{"value": "Toyota"}, {"value": ""}, {"value": "2015"}],
            "stock": 3
        }))
        .unwrap();
        let product = Product::from(record);

        assert_eq!(product.id, ProductId::new(12));
        assert_eq!(product.image, "products/pad.jpg");
        assert_eq!(product.price, 45000.0);
        assert_eq!(product.old_price, Some(52000.0));
        assert_eq!(product.rating, Some(4.5));
        assert_eq!(product.reviews, Some(8));
        assert_eq!(product.attributes, vec!["Toyota".to_string(), "2015".to_string()]);
        assert!(product.is_on_sale());
    }

    #[test]
    fn test_backend_record_defaults() {
        let record: ProductRecord =
            serde_json::from_value(serde_json::json!({"id": "5", "name": "Filter", "images": null}))
                .unwrap();
        let product = Product::from(record);

        assert_eq!(product.id, ProductId::new(5));
        assert_eq!(product.image, PLACEHOLDER_IMAGE);
        assert_eq!(product.price, 0.0);
        assert_eq!(product.old_price, None);
        assert!(product.attributes.is_empty());
    }

    #[test]
    fn test_image_url() {
        let base = Some("https://cdn.example/storage/");
        assert_eq!(image_url(None, base), PLACEHOLDER_IMAGE);
        assert_eq!(image_url(Some(""), base), PLACEHOLDER_IMAGE);
        assert_eq!(
            image_url(Some("https://img.example/a.png"), base),
            "https://img.example/a.png"
        );
        assert_eq!(
            image_url(Some("//banners/b.png"), base),
            "https://cdn.example/storage/banners/b.png"
        );
        assert_eq!(image_url(Some("b.png"), None), "b.png");
    }
}

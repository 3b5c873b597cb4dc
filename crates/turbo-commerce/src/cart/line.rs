//! Cart lines as kept in durable storage.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::Product;
use crate::error::CartError;
use crate::ids::ProductId;
use crate::reader::lenient_list;

/// Maximum quantity allowed per line item.
pub const MAX_QUANTITY_PER_ITEM: u32 = 9999;

/// Durable key holding the local cart.
pub const CART_ITEMS_KEY: &str = "cart_items";

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Product as it looked when it was added. Lines that came back from
    /// the server may not carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

/// The local cart: at most one line per product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartLines(Vec<CartLine>);

impl CartLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a stored cart. Bad shapes and bad lines are dropped.
    pub fn from_json(value: Value) -> Self {
        Self::from(lenient_list::<CartLine>(value))
    }

    /// Add `quantity` of `product`, merging into its existing line.
    ///
    /// Returns the line's new quantity.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<u32, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        if let Some(existing) = self.0.iter_mut().find(|l| l.product_id == product.id) {
            let new_quantity = u64::from(existing.quantity) + u64::from(quantity);
            if new_quantity > u64::from(MAX_QUANTITY_PER_ITEM) {
                return Err(CartError::QuantityExceedsLimit(
                    new_quantity,
                    MAX_QUANTITY_PER_ITEM,
                ));
            }
            existing.quantity = new_quantity as u32;
            return Ok(existing.quantity);
        }

        if quantity > MAX_QUANTITY_PER_ITEM {
            return Err(CartError::QuantityExceedsLimit(
                u64::from(quantity),
                MAX_QUANTITY_PER_ITEM,
            ));
        }

        self.0.push(CartLine {
            product_id: product.id,
            quantity,
            product: Some(product.clone()),
        });
        Ok(quantity)
    }

    pub fn get(&self, product: ProductId) -> Option<&CartLine> {
        self.0.iter().find(|l| l.product_id == product)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CartLine> {
        self.0.iter()
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> u64 {
        self.0.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Sum of `price * quantity` over lines that carry a product snapshot.
    pub fn subtotal(&self) -> f64 {
        self.0
            .iter()
            .filter_map(|l| Some(l.product.as_ref()?.price * f64::from(l.quantity)))
            .sum()
    }

    pub fn into_inner(self) -> Vec<CartLine> {
        self.0
    }
}

impl From<Vec<CartLine>> for CartLines {
    /// Lines for the same product are folded together, keeping the first
    /// snapshot.
    fn from(lines: Vec<CartLine>) -> Self {
        let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity == 0 {
                continue;
            }
            match merged.iter_mut().find(|l| l.product_id == line.product_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                    if existing.product.is_none() {
                        existing.product = line.product;
                    }
                }
                None => merged.push(line),
            }
        }
        Self(merged)
    }
}

impl<'a> IntoIterator for &'a CartLines {
    type Item = &'a CartLine;
    type IntoIter = std::slice::Iter<'a, CartLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

//! Catalog records as the cart sees them.
//!
//! Products and variants are read-only here; the storefront loads them from
//! `PostgreSQL` and the CLI seeds them.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId, VariantId};

/// A product shown in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// URL slug, unique per product.
    pub slug: String,
    /// Image path relative to the media root, if any.
    pub image: Option<String>,
    pub short_description: String,
    pub long_description: String,
}

/// A purchasable SKU of a [`Product`] (size, colour, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub name: Option<String>,
    pub price: Price,
    /// Promotional price, when the variant is on sale.
    pub promotional_price: Option<Price>,
    /// Units currently in stock.
    pub stock: u32,
}

impl Variant {
    /// Name shown to customers, falling back to the product name for
    /// variants without one.
    #[must_use]
    pub fn display_name<'a>(&'a self, product: &'a Product) -> &'a str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &product.name,
        }
    }

    /// Whether at least one unit can be added to a cart.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// The price a customer actually pays for one unit.
    #[must_use]
    pub fn effective_price(&self) -> Price {
        self.promotional_price
            .filter(Price::is_positive)
            .unwrap_or(self.price)
    }
}

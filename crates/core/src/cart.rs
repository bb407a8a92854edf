//! Session cart and the rules for changing it.
//!
//! The cart is a map from variant id (as a string, the session key) to a
//! [`CartLineItem`]. It is small, serialized as JSON into the session on every
//! change, and only ever mutated through [`Cart::add_item`] and
//! [`Cart::remove_item`] so the stock and line-total invariants hold:
//!
//! - a quantity never exceeds the variant stock seen at mutation time
//! - `line_total == unit_price * quantity` (same for the promotional pair)
//! - a quantity is never zero; items leave the cart only by removal

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Product, Variant};
use crate::types::{Price, ProductId, VariantId};

/// Reasons a cart request cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The request did not say which variant to act on.
    #[error("no variant specified")]
    MissingVariant,

    /// No variant exists with the given id.
    #[error("variant not found: {0}")]
    VariantNotFound(String),

    /// The variant has no stock left.
    #[error("variant is out of stock")]
    OutOfStock,
}

/// What [`Cart::add_item`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The variant was not in the cart and now has quantity 1.
    Added,
    /// The quantity went up.
    Updated { quantity: u32 },
    /// The requested quantity exceeded stock and was cut down to it.
    Clamped { requested: u32, quantity: u32 },
}

/// One cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub variant_id: VariantId,
    /// Variant name; empty for single-variant products.
    pub variant_name: String,
    pub unit_price: Price,
    pub promotional_unit_price: Option<Price>,
    pub quantity: u32,
    pub line_total: Price,
    pub promotional_line_total: Option<Price>,
    pub slug: String,
    /// Image path relative to the media root; empty when the product has none.
    pub image: String,
}

impl CartLineItem {
    fn new(product: &Product, variant: &Variant) -> Self {
        let mut item = Self {
            product_id: product.id,
            product_name: product.name.clone(),
            variant_id: variant.id,
            variant_name: variant.name.clone().unwrap_or_default(),
            unit_price: variant.price,
            promotional_unit_price: variant.promotional_price,
            quantity: 1,
            line_total: variant.price,
            promotional_line_total: variant.promotional_price,
            slug: product.slug.clone(),
            image: product.image.clone().unwrap_or_default(),
        };
        item.set_quantity(1);
        item
    }

    /// Set the quantity and recompute both line totals.
    fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.line_total = self.unit_price.times(quantity);
        self.promotional_line_total = self.promotional_unit_price.map(|p| p.times(quantity));
    }

    /// Product and variant name as shown in messages, e.g. `Camiseta P`.
    #[must_use]
    pub fn label(&self) -> String {
        if self.variant_name.trim().is_empty() {
            self.product_name.clone()
        } else {
            format!("{} {}", self.product_name, self.variant_name)
        }
    }

    /// Unit price the customer pays (promotional when set and positive).
    #[must_use]
    pub fn effective_unit_price(&self) -> Price {
        self.promotional_unit_price
            .filter(Price::is_positive)
            .unwrap_or(self.unit_price)
    }

    /// Line total the customer pays (promotional when set and positive).
    #[must_use]
    pub fn effective_line_total(&self) -> Price {
        self.promotional_line_total
            .filter(Price::is_positive)
            .unwrap_or(self.line_total)
    }

    /// Whether a promotional price applies to this line.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.effective_unit_price() != self.unit_price
    }
}

/// The shopping cart stored in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: BTreeMap<String, CartLineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct line items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Look up a line item by its session key.
    #[must_use]
    pub fn get(&self, variant_id: &str) -> Option<&CartLineItem> {
        self.items.get(variant_id)
    }

    /// Iterate line items ordered by key.
    pub fn items(&self) -> impl Iterator<Item = &CartLineItem> {
        self.items.values()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items.values().map(|item| item.quantity).sum()
    }

    /// Amount due, using promotional line totals where they apply.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items
            .values()
            .map(CartLineItem::effective_line_total)
            .sum()
    }

    /// Add one unit of `variant` to the cart.
    ///
    /// Stock is checked against the variant as loaded for this request. When
    /// the variant is already in the cart its unit prices are refreshed from
    /// the catalog before the line totals are recomputed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutOfStock`] if the variant has no stock; the cart
    /// is left untouched.
    pub fn add_item(
        &mut self,
        product: &Product,
        variant: &Variant,
    ) -> Result<AddOutcome, CartError> {
        if !variant.in_stock() {
            return Err(CartError::OutOfStock);
        }

        let key = variant.id.to_string();
        let Some(item) = self.items.get_mut(&key) else {
            self.items.insert(key, CartLineItem::new(product, variant));
            return Ok(AddOutcome::Added);
        };

        let previous = item.quantity;
        let requested = previous.saturating_add(1);
        let quantity = requested.min(variant.stock);

        item.unit_price = variant.price;
        item.promotional_unit_price = variant.promotional_price;
        item.set_quantity(quantity);

        if requested > variant.stock {
            Ok(AddOutcome::Clamped {
                requested,
                quantity,
            })
        } else {
            debug_assert!(quantity > previous);
            Ok(AddOutcome::Updated { quantity })
        }
    }

    /// Remove the line for `variant_id`, returning it if it was present.
    pub fn remove_item(&mut self, variant_id: &str) -> Option<CartLineItem> {
        self.items.remove(variant_id.trim())
    }
}

/// Parse the `vid` request parameter.
///
/// # Errors
///
/// Returns [`CartError::MissingVariant`] when the parameter is absent or
/// blank and [`CartError::VariantNotFound`] when it cannot name a variant.
pub fn parse_variant_param(raw: Option<&str>) -> Result<VariantId, CartError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());
    let raw = raw.ok_or(CartError::MissingVariant)?;
    raw.parse()
        .map_err(|_| CartError::VariantNotFound(raw.to_string()))
}

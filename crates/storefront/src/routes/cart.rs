//! Cart route handlers.
//!
//! Add and remove are plain GET links that change the session cart and
//! redirect back with a flash message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Redirect,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use loja_core::{Cart, CartError, CartLineItem, parse_variant_param};

use super::{PageContext, back_target, flash_redirect};
use crate::db::CatalogRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::services::cart::{
    CartStore, add_error_message, add_message, not_in_cart_message,
    remove_missing_variant_message, removed_message,
};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub variant_id: String,
    pub label: String,
    pub slug: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    /// Regular unit price, set only when a promotion applies.
    pub original_unit_price: Option<String>,
    pub line_total: String,
    /// Regular line total, set only when a promotion applies.
    pub original_line_total: Option<String>,
}

impl From<&CartLineItem> for CartItemView {
    fn from(item: &CartLineItem) -> Self {
        let discounted = item.is_discounted();
        Self {
            variant_id: item.variant_id.to_string(),
            label: item.label(),
            slug: item.slug.clone(),
            image: Some(item.image.clone()).filter(|i| !i.is_empty()),
            quantity: item.quantity,
            unit_price: item.effective_unit_price().display(),
            original_unit_price: discounted.then(|| item.unit_price.display()),
            line_total: item.effective_line_total().display(),
            original_line_total: discounted.then(|| item.line_total.display()),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().map(CartItemView::from).collect(),
            subtotal: cart.total().display(),
            item_count: cart.total_quantity(),
        }
    }
}

/// `vid` query parameter shared by add and remove.
#[derive(Debug, Deserialize)]
pub struct VariantQuery {
    pub vid: Option<String>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

/// Display cart page.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<CartShowTemplate> {
    let cart = CartStore::new(&session).load().await?;

    Ok(CartShowTemplate {
        page: PageContext::load(&session).await,
        cart: CartView::from(&cart),
    })
}

/// Add one unit of a variant to the cart.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Query(query): Query<VariantQuery>,
) -> Result<Redirect> {
    let back = back_target(&headers, &state.config().base_url);

    let variant_id = match parse_variant_param(query.vid.as_deref()) {
        Ok(id) => id,
        Err(CartError::VariantNotFound(raw)) => {
            return Err(AppError::NotFound(format!("variant {raw}")));
        }
        Err(err) => return Ok(flash_redirect(&session, add_error_message(&err), &back).await?),
    };

    let (product, variant) = CatalogRepository::new(state.pool())
        .get_variant(variant_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("variant {variant_id}")))?;

    let store = CartStore::new(&session);
    let mut cart = store.load().await?;

    let message = match cart.add_item(&product, &variant) {
        Ok(outcome) => {
            store.save(&cart).await?;

            let key = variant_id.to_string();
            add_breadcrumb("cart", "Added item", Some(&[("variant_id", key.as_str())]));
            info!(variant_id = %variant_id, ?outcome, "Cart item added");

            let label = cart
                .get(&key)
                .map_or_else(|| product.name.clone(), CartLineItem::label);
            add_message(outcome, &label)
        }
        Err(err) => {
            warn!(variant_id = %variant_id, error = %err, "Cart add rejected");
            add_error_message(&err)
        }
    };

    Ok(flash_redirect(&session, message, &back).await?)
}

/// Remove a variant's line from the cart.
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Query(query): Query<VariantQuery>,
) -> Result<Redirect> {
    let back = back_target(&headers, &state.config().base_url);

    let Some(variant_id) = query.vid.as_deref().map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(flash_redirect(&session, remove_missing_variant_message(), &back).await?);
    };

    let store = CartStore::new(&session);
    let mut cart = store.load().await?;

    let Some(removed) = cart.remove_item(variant_id) else {
        return Ok(flash_redirect(&session, not_in_cart_message(), &back).await?);
    };

    store.save(&cart).await?;

    add_breadcrumb("cart", "Removed item", Some(&[("variant_id", variant_id)]));
    info!(variant_id, "Cart item removed");

    Ok(flash_redirect(&session, removed_message(&removed), &back).await?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use loja_core::{Price, Product, ProductId, Variant, VariantId};

    use super::*;

    #[test]
    fn test_cart_view_uses_promotional_totals() {
        let product = Product {
            id: ProductId::new(1),
            name: "Camiseta".to_string(),
            slug: "camiseta".to_string(),
            image: None,
            short_description: String::new(),
            long_description: String::new(),
        };
        let variant = Variant {
            id: VariantId::new(2),
            product_id: product.id,
            name: Some("M".to_string()),
            price: Price::from_cents(5000),
            promotional_price: Some(Price::from_cents(4000)),
            stock: 5,
        };

        let mut cart = Cart::new();
        cart.add_item(&product, &variant).unwrap();
        cart.add_item(&product, &variant).unwrap();

        let view = CartView::from(&cart);
        assert_eq!(view.item_count, 2);
        assert_eq!(view.subtotal, "R$ 80,00");

        let item = view.items.first().unwrap();
        assert_eq!(item.label, "Camiseta M");
        assert_eq!(item.line_total, "R$ 80,00");
        assert_eq!(item.original_line_total.as_deref(), Some("R$ 100,00"));
        assert_eq!(item.image, None);
    }
}

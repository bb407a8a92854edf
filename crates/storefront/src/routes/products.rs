//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use loja_core::{Product, Variant};

use super::PageContext;
use crate::db::catalog::ProductListing;
use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;

/// Product card data for the listing.
#[derive(Clone)]
pub struct ProductCardView {
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub short_description: String,
    /// Price shown on the card, lowest across variants.
    pub price: Option<String>,
    /// Regular price struck through when a promotion lowers the card price.
    pub original_price: Option<String>,
}

impl From<&ProductListing> for ProductCardView {
    fn from(listing: &ProductListing) -> Self {
        let original_price = match (listing.min_price, listing.min_effective_price) {
            (Some(regular), Some(effective)) if effective < regular => Some(regular.display()),
            _ => None,
        };

        Self {
            name: listing.product.name.clone(),
            slug: listing.product.slug.clone(),
            image: listing.product.image.clone(),
            short_description: listing.product.short_description.clone(),
            price: listing.min_effective_price.map(|p| p.display()),
            original_price,
        }
    }
}

/// Product detail data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub short_description: String,
    pub long_description: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            slug: product.slug.clone(),
            image: product.image.clone(),
            short_description: product.short_description.clone(),
            long_description: product.long_description.clone(),
        }
    }
}

/// Variant option in the add-to-cart picker.
#[derive(Clone)]
pub struct VariantView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub promotional_price: Option<String>,
    pub in_stock: bool,
}

impl VariantView {
    fn new(product: &Product, variant: &Variant) -> Self {
        Self {
            id: variant.id.to_string(),
            name: variant.display_name(product).to_string(),
            price: variant.price.display(),
            promotional_price: variant
                .promotional_price
                .filter(|p| p.is_positive() && *p < variant.price)
                .map(|p| p.display()),
            in_stock: variant.in_stock(),
        }
    }
}

/// Pagination links for the listing.
#[derive(Clone)]
pub struct PaginationView {
    pub current: u32,
    pub total_pages: u32,
    pub pages: Vec<u32>,
}

impl PaginationView {
    fn new(current: u32, total: u64, per_page: u32) -> Self {
        let total_pages = u32::try_from(total.div_ceil(u64::from(per_page.max(1))))
            .unwrap_or(u32::MAX)
            .max(1);

        Self {
            current,
            total_pages,
            pages: (1..=total_pages).collect(),
        }
    }

    #[must_use]
    pub const fn previous(&self) -> Option<u32> {
        if self.current > 1 {
            Some(self.current - 1)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn next(&self) -> Option<u32> {
        if self.current < self.total_pages {
            Some(self.current + 1)
        } else {
            None
        }
    }
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<String>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCardView>,
    pub pagination: PaginationView,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: ProductView,
    pub variants: Vec<VariantView>,
    pub any_in_stock: bool,
}

/// Display product listing page, newest first.
///
/// Pages outside the listing are 404s, except page 1 of an empty catalog.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PaginationQuery>,
) -> Result<ProductsIndexTemplate> {
    let current = match query.page.as_deref().map(str::trim) {
        None | Some("") => 1,
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| AppError::NotFound(format!("page {raw}")))?,
    };

    let catalog = state.catalog();
    let listing = catalog.page(current).await?;
    let pagination = PaginationView::new(current, listing.total, catalog.per_page());

    if current > pagination.total_pages {
        return Err(AppError::NotFound(format!("page {current}")));
    }

    Ok(ProductsIndexTemplate {
        page: PageContext::load(&session).await,
        products: listing.products.iter().map(ProductCardView::from).collect(),
        pagination,
    })
}

/// Display product detail page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> Result<ProductShowTemplate> {
    let detail = state
        .catalog()
        .product(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    let variants: Vec<VariantView> = detail
        .variants
        .iter()
        .map(|v| VariantView::new(&detail.product, v))
        .collect();

    Ok(ProductShowTemplate {
        page: PageContext::load(&session).await,
        product: ProductView::from(&detail.product),
        any_in_stock: variants.iter().any(|v| v.in_stock),
        variants,
    })
}

//! Catalog repository: products and their variants.
//!
//! Stock and prices are read fresh on every call. Page-level caching happens
//! one layer up in [`crate::services::catalog`]; cart mutations go straight
//! to [`CatalogRepository::get_variant`] so stock checks never see stale data.

use rust_decimal::Decimal;
use sqlx::PgPool;

use loja_core::{Price, Product, ProductId, Variant, VariantId};

use super::RepositoryError;

/// A product as shown on the listing page.
#[derive(Debug, Clone)]
pub struct ProductListing {
    pub product: Product,
    /// Lowest regular price across variants.
    pub min_price: Option<Price>,
    /// Lowest price a customer pays across variants.
    pub min_effective_price: Option<Price>,
}

/// One page of the product listing.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<ProductListing>,
    /// Total number of products across all pages.
    pub total: u64,
}

/// A product with all of its variants.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: Product,
    pub variants: Vec<Variant>,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    slug: String,
    image: Option<String>,
    short_description: String,
    long_description: String,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            slug: row.slug,
            image: row.image.filter(|i| !i.is_empty()),
            short_description: row.short_description,
            long_description: row.long_description,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ListingRow {
    #[sqlx(flatten)]
    product: ProductRow,
    min_price: Option<Decimal>,
    min_effective_price: Option<Decimal>,
}

#[derive(sqlx::FromRow)]
struct VariantRow {
    id: i32,
    product_id: i32,
    name: Option<String>,
    price: Decimal,
    promotional_price: Option<Decimal>,
    stock: i32,
}

impl TryFrom<VariantRow> for Variant {
    type Error = RepositoryError;

    fn try_from(row: VariantRow) -> Result<Self, Self::Error> {
        let stock = u32::try_from(row.stock).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "variant {} has negative stock {}",
                row.id, row.stock
            ))
        })?;

        Ok(Self {
            id: VariantId::new(row.id),
            product_id: ProductId::new(row.product_id),
            name: row.name.filter(|n| !n.trim().is_empty()),
            price: Price::new(row.price),
            promotional_price: row.promotional_price.map(Price::new),
            stock,
        })
    }
}

/// Repository for catalog queries.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products newest first, one page at a time.
    ///
    /// `page` is 1-based; pages past the end come back empty.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_page(&self, page: u32, per_page: u32) -> Result<ProductPage, RepositoryError> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(per_page);

        let rows = sqlx::query_as::<_, ListingRow>(
            r"
            SELECT p.id, p.name, p.slug, p.image, p.short_description, p.long_description,
                   MIN(v.price) AS min_price,
                   MIN(COALESCE(NULLIF(v.promotional_price, 0), v.price)) AS min_effective_price
            FROM loja.product p
            LEFT JOIN loja.variant v ON v.product_id = p.id
            GROUP BY p.id
            ORDER BY p.id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(i64::from(per_page))
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loja.product")
            .fetch_one(self.pool)
            .await?;

        Ok(ProductPage {
            products: rows
                .into_iter()
                .map(|row| ProductListing {
                    product: row.product.into(),
                    min_price: row.min_price.map(Price::new),
                    min_effective_price: row.min_effective_price.map(Price::new),
                })
                .collect(),
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    /// Get a product and its variants by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if a variant row is invalid.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<ProductDetail>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, slug, image, short_description, long_description
            FROM loja.product
            WHERE slug = $1
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let variants = sqlx::query_as::<_, VariantRow>(
            r"
            SELECT id, product_id, name, price, promotional_price, stock
            FROM loja.variant
            WHERE product_id = $1
            ORDER BY id
            ",
        )
        .bind(row.id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(Variant::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(ProductDetail {
            product: row.into(),
            variants,
        }))
    }

    /// Get a variant together with the product it belongs to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if the variant row is invalid
    /// or its product is missing.
    pub async fn get_variant(
        &self,
        id: VariantId,
    ) -> Result<Option<(Product, Variant)>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, VariantRow>(
            r"
            SELECT id, product_id, name, price, promotional_price, stock
            FROM loja.variant
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let variant = Variant::try_from(row)?;

        let product = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, slug, image, short_description, long_description
            FROM loja.product
            WHERE id = $1
            ",
        )
        .bind(variant.product_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| {
            RepositoryError::DataCorruption(format!("variant {} has no product", variant.id))
        })?;

        Ok(Some((product.into(), variant)))
    }
}

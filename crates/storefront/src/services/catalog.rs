//! Catalog reads for the listing and detail pages, cached with `moka`.
//!
//! Cart mutations do not go through here: they read the variant straight from
//! [`CatalogRepository::get_variant`] so the stock check sees current data.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use crate::db::RepositoryError;
use crate::db::catalog::{CatalogRepository, ProductDetail, ProductPage};

/// Cache key for catalog pages.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Page(u32),
    Product(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Page(Arc<ProductPage>),
    Product(Arc<ProductDetail>),
}

/// Cached catalog access shared across requests.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    pool: PgPool,
    per_page: u32,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogService {
    /// Create a catalog service with the given page size and cache lifetime.
    #[must_use]
    pub fn new(pool: PgPool, per_page: u32, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();

        Self {
            inner: Arc::new(CatalogServiceInner {
                pool,
                per_page,
                cache,
            }),
        }
    }

    /// Products per listing page.
    #[must_use]
    pub fn per_page(&self) -> u32 {
        self.inner.per_page
    }

    /// Get one listing page (1-based).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database query fails.
    #[instrument(skip(self))]
    pub async fn page(&self, page: u32) -> Result<Arc<ProductPage>, RepositoryError> {
        let key = CacheKey::Page(page);
        if let Some(CacheValue::Page(cached)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product page");
            return Ok(cached);
        }

        let listing = Arc::new(
            CatalogRepository::new(&self.inner.pool)
                .list_page(page, self.inner.per_page)
                .await?,
        );

        self.inner
            .cache
            .insert(key, CacheValue::Page(Arc::clone(&listing)))
            .await;

        Ok(listing)
    }

    /// Get a product with its variants by slug.
    ///
    /// Missing products are not cached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database query fails.
    #[instrument(skip(self))]
    pub async fn product(&self, slug: &str) -> Result<Option<Arc<ProductDetail>>, RepositoryError> {
        let key = CacheKey::Product(slug.to_string());
        if let Some(CacheValue::Product(cached)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(Some(cached));
        }

        let Some(detail) = CatalogRepository::new(&self.inner.pool)
            .get_by_slug(slug)
            .await?
        else {
            return Ok(None);
        };

        let detail = Arc::new(detail);
        self.inner
            .cache
            .insert(key, CacheValue::Product(Arc::clone(&detail)))
            .await;

        Ok(Some(detail))
    }
}

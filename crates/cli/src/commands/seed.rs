//! Seed the catalog from a YAML file.
//!
//! Products are matched by slug and variants by SKU, so running the same
//! file twice updates rows instead of duplicating them.
//!
//! ```yaml
//! products:
//!   - name: Camiseta Básica
//!     slug: camiseta-basica
//!     image: produtos/camiseta.jpg
//!     short_description: Algodão orgânico
//!     long_description: Camiseta de algodão orgânico com gola careca.
//!     variants:
//!       - sku: CAM-P
//!         name: P
//!         price: "49.90"
//!         promotional_price: "39.90"
//!         stock: 10
//! ```

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use super::{CommandError, connect};

/// Root of a catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub products: Vec<ProductEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ProductEntry {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub long_description: String,
    #[serde(default)]
    pub variants: Vec<VariantEntry>,
}

#[derive(Debug, Deserialize)]
pub struct VariantEntry {
    pub sku: String,
    #[serde(default)]
    pub name: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub promotional_price: Option<Decimal>,
    #[serde(default = "default_stock")]
    pub stock: u32,
}

const fn default_stock() -> u32 {
    1
}

/// Counts reported after seeding.
#[derive(Debug, Default)]
pub struct SeedSummary {
    pub products: usize,
    pub variants: usize,
}

/// Parse a catalog file body.
///
/// # Errors
///
/// Returns `CommandError::Yaml` for malformed YAML.
pub fn parse_catalog(content: &str) -> Result<CatalogFile, CommandError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Check a parsed catalog before touching the database.
///
/// Returns every problem found, not just the first.
#[must_use]
pub fn validate_catalog(catalog: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut slugs = HashSet::new();
    let mut skus = HashSet::new();

    for product in &catalog.products {
        let slug = product.slug.trim();
        if product.name.trim().is_empty() {
            errors.push(format!("product '{slug}' has no name"));
        }
        if slug.is_empty() {
            errors.push(format!("product '{}' has no slug", product.name));
        } else if !slugs.insert(slug) {
            errors.push(format!("duplicate slug '{slug}'"));
        }

        for variant in &product.variants {
            let sku = variant.sku.trim();
            if sku.is_empty() {
                errors.push(format!("a variant of '{slug}' has no SKU"));
            } else if !skus.insert(sku) {
                errors.push(format!("duplicate SKU '{sku}'"));
            }
            if variant.price.is_sign_negative() {
                errors.push(format!("variant '{sku}' has a negative price"));
            }
            if variant
                .promotional_price
                .is_some_and(|p| p.is_sign_negative())
            {
                errors.push(format!("variant '{sku}' has a negative promotional price"));
            }
            if i32::try_from(variant.stock).is_err() {
                errors.push(format!("variant '{sku}' has an out of range stock"));
            }
        }
    }

    errors
}

/// Upsert the catalog in `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails
/// validation, or a database write fails.
pub async fn catalog(file_path: &str) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading catalog from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: file_path.to_string(),
            source,
        })?;
    let catalog = parse_catalog(&content)?;

    let errors = validate_catalog(&catalog);
    if !errors.is_empty() {
        for err in &errors {
            tracing::error!("  - {err}");
        }
        return Err(CommandError::InvalidCatalog(format!(
            "{} validation errors found",
            errors.len()
        )));
    }

    let pool = connect().await?;
    let summary = upsert_catalog(&pool, &catalog).await?;

    info!(
        products = summary.products,
        variants = summary.variants,
        "Catalog seeded"
    );
    Ok(())
}

/// Write every product and variant in one transaction.
async fn upsert_catalog(pool: &PgPool, catalog: &CatalogFile) -> Result<SeedSummary, CommandError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();

    for product in &catalog.products {
        let product_id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO loja.product (name, slug, image, short_description, long_description)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (slug) DO UPDATE SET
                name = EXCLUDED.name,
                image = EXCLUDED.image,
                short_description = EXCLUDED.short_description,
                long_description = EXCLUDED.long_description,
                updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(product.name.trim())
        .bind(product.slug.trim())
        .bind(product.image.as_deref())
        .bind(&product.short_description)
        .bind(&product.long_description)
        .fetch_one(&mut *tx)
        .await?;
        summary.products += 1;

        for variant in &product.variants {
            let stock = i32::try_from(variant.stock).map_err(|_| {
                CommandError::InvalidCatalog(format!("stock out of range for '{}'", variant.sku))
            })?;

            sqlx::query(
                r"
                INSERT INTO loja.variant (product_id, sku, name, price, promotional_price, stock)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (sku) DO UPDATE SET
                    product_id = EXCLUDED.product_id,
                    name = EXCLUDED.name,
                    price = EXCLUDED.price,
                    promotional_price = EXCLUDED.promotional_price,
                    stock = EXCLUDED.stock
                ",
            )
            .bind(product_id)
            .bind(variant.sku.trim())
            .bind(variant.name.as_deref())
            .bind(variant.price)
            .bind(variant.promotional_price)
            .bind(stock)
            .execute(&mut *tx)
            .await?;
            summary.variants += 1;
        }
    }

    tx.commit().await?;
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
products:
  - name: Camiseta
    slug: camiseta
    variants:
      - sku: CAM-P
        name: P
        price: "49.90"
        promotional_price: "39.90"
        stock: 10
      - sku: CAM-M
        price: "49.90"
  - name: Caneca
    slug: caneca
    image: produtos/caneca.jpg
"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = parse_catalog(SAMPLE).unwrap();
        assert_eq!(catalog.products.len(), 2);

        let shirt = &catalog.products[0];
        assert_eq!(shirt.variants.len(), 2);
        assert_eq!(shirt.variants[0].price, Decimal::new(4990, 2));
        assert_eq!(shirt.variants[0].promotional_price, Some(Decimal::new(3990, 2)));
        assert_eq!(shirt.variants[1].stock, 1);
        assert!(shirt.variants[1].name.is_none());

        let mug = &catalog.products[1];
        assert_eq!(mug.image.as_deref(), Some("produtos/caneca.jpg"));
        assert!(mug.variants.is_empty());
    }

    #[test]
    fn test_validate_catalog_ok() {
        let catalog = parse_catalog(SAMPLE).unwrap();
        assert!(validate_catalog(&catalog).is_empty());
    }

    #[test]
    fn test_validate_catalog_reports_duplicates() {
        let catalog = parse_catalog(
            r#"
products:
  - name: A
    slug: a
    variants:
      - sku: X
        price: "1.00"
  - name: B
    slug: a
    variants:
      - sku: X
        price: "-2.00"
"#,
        )
        .unwrap();

        let errors = validate_catalog(&catalog);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("duplicate slug 'a'")));
        assert!(errors.iter().any(|e| e.contains("duplicate SKU 'X'")));
        assert!(errors.iter().any(|e| e.contains("negative price")));
    }

    #[test]
    fn test_parse_catalog_rejects_missing_price() {
        let result = parse_catalog(
            r"
products:
  - name: A
    slug: a
    variants:
      - sku: X
",
        );
        assert!(matches!(result, Err(CommandError::Yaml(_))));
    }
}

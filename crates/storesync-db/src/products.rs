//! Database operations for per-storefront `products` tables.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{qualified, validate_storefront_name, DbError};

/// A row from a storefront's `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub category: Option<String>,
    pub base_price: Decimal,
    pub images: Vec<String>,
    /// Shopify product id as a string; the reverse-lookup key for
    /// reconciliation. `NULL` for manually entered products.
    pub source_shopify_id: Option<String>,
    pub is_active: bool,
    pub view_count: i64,
    pub purchase_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const PRODUCT_COLUMNS: &str = "id, name, slug, category, base_price, images, \
     source_shopify_id, is_active, view_count, purchase_count, created_at, updated_at";

/// Fields for creating a product via the import path.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub category: Option<String>,
    pub base_price: Decimal,
    pub images: Vec<String>,
    pub source_shopify_id: Option<String>,
    pub is_active: bool,
}

/// Finds every product in one storefront whose `source_shopify_id` equals the
/// external product id. Normally at most one row, but duplicates are possible
/// and all are returned. An empty result is not an error — the product may
/// simply not have been imported into this storefront.
///
/// # Errors
///
/// Returns [`DbError::InvalidStorefrontName`] or [`DbError::Sqlx`].
pub async fn find_products_by_source_id(
    pool: &PgPool,
    storefront: &str,
    source_shopify_id: &str,
) -> Result<Vec<ProductRow>, DbError> {
    validate_storefront_name(storefront)?;

    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} FROM {} WHERE source_shopify_id = $1",
        qualified(storefront, "products")
    );
    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(source_shopify_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Writes the reconciled top-level fields: base price, image list, and the
/// update timestamp. Nothing else on the product is touched.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the product row no longer exists,
/// [`DbError::InvalidStorefrontName`], or [`DbError::Sqlx`].
pub async fn update_product_sync_fields(
    pool: &PgPool,
    storefront: &str,
    product_id: i64,
    base_price: Decimal,
    images: &[String],
) -> Result<(), DbError> {
    validate_storefront_name(storefront)?;

    let sql = format!(
        "UPDATE {} SET base_price = $1, images = $2, updated_at = NOW() WHERE id = $3",
        qualified(storefront, "products")
    );
    let result = sqlx::query(&sql)
        .bind(base_price)
        .bind(images)
        .bind(product_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Upserts a product by slug, used by the catalog importer.
///
/// Returns the internal `id` of the upserted row.
///
/// # Errors
///
/// Returns [`DbError::InvalidStorefrontName`] or [`DbError::Sqlx`].
pub async fn upsert_product(
    pool: &PgPool,
    storefront: &str,
    product: &NewProduct,
) -> Result<i64, DbError> {
    validate_storefront_name(storefront)?;

    let sql = format!(
        "INSERT INTO {} (name, slug, category, base_price, images, source_shopify_id, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (slug) DO UPDATE SET \
             name              = EXCLUDED.name, \
             category          = EXCLUDED.category, \
             base_price        = EXCLUDED.base_price, \
             images            = EXCLUDED.images, \
             source_shopify_id = EXCLUDED.source_shopify_id, \
             is_active         = EXCLUDED.is_active, \
             updated_at        = NOW() \
         RETURNING id",
        qualified(storefront, "products")
    );
    let id: i64 = sqlx::query_scalar(&sql)
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.category)
        .bind(product.base_price)
        .bind(&product.images)
        .bind(&product.source_shopify_id)
        .bind(product.is_active)
        .fetch_one(pool)
        .await?;

    Ok(id)
}

//! Database operations for per-storefront `product_variants` tables.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{qualified, validate_storefront_name, DbError};

/// A row from a storefront's `product_variants` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantRow {
    pub id: i64,
    pub product_id: i64,
    /// Free-text size label, e.g. `"M"` or `"One Size"`.
    pub size: Option<String>,
    pub color: Option<String>,
    /// Authoritative match key when present; unique within a storefront.
    pub sku: Option<String>,
    pub stock: i64,
    /// Variant price when it differs from the product's base price.
    pub price_override: Option<Decimal>,
    /// Shopify inventory item id as a string, set by the importer.
    pub shopify_inventory_item_id: Option<String>,
    pub images: Vec<String>,
    pub purchase_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const VARIANT_COLUMNS: &str = "id, product_id, size, color, sku, stock, price_override, \
     shopify_inventory_item_id, images, purchase_count, created_at, updated_at";

/// Fields for creating a variant via the import path.
#[derive(Debug, Clone)]
pub struct NewVariant {
    pub size: Option<String>,
    pub color: Option<String>,
    pub sku: Option<String>,
    pub stock: i64,
    pub price_override: Option<Decimal>,
    pub shopify_inventory_item_id: Option<String>,
    pub images: Vec<String>,
}

/// Lists all variants of one product, ordered by id for stable matching.
///
/// # Errors
///
/// Returns [`DbError::InvalidStorefrontName`] or [`DbError::Sqlx`].
pub async fn list_variants(
    pool: &PgPool,
    storefront: &str,
    product_id: i64,
) -> Result<Vec<VariantRow>, DbError> {
    validate_storefront_name(storefront)?;

    let sql = format!(
        "SELECT {VARIANT_COLUMNS} FROM {} WHERE product_id = $1 ORDER BY id",
        qualified(storefront, "product_variants")
    );
    let rows = sqlx::query_as::<_, VariantRow>(&sql)
        .bind(product_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Writes the reconciled variant fields.
///
/// `price_override = None` explicitly clears a stale override — when the
/// source stops specifying a variant price, the stored override must not
/// linger. `images = None` means "no image update": the existing list is
/// preserved rather than cleared.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the variant row no longer exists,
/// [`DbError::InvalidStorefrontName`], or [`DbError::Sqlx`].
pub async fn update_variant_reconciled(
    pool: &PgPool,
    storefront: &str,
    variant_id: i64,
    stock: i64,
    price_override: Option<Decimal>,
    images: Option<&[String]>,
) -> Result<(), DbError> {
    validate_storefront_name(storefront)?;

    let sql = format!(
        "UPDATE {} SET \
             stock = $1, \
             price_override = $2, \
             images = COALESCE($3, images), \
             updated_at = NOW() \
         WHERE id = $4",
        qualified(storefront, "product_variants")
    );
    let result = sqlx::query(&sql)
        .bind(stock)
        .bind(price_override)
        .bind(images)
        .bind(variant_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Writes only the stock count, used by the inventory-level path.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the variant row no longer exists,
/// [`DbError::InvalidStorefrontName`], or [`DbError::Sqlx`].
pub async fn update_variant_stock(
    pool: &PgPool,
    storefront: &str,
    variant_id: i64,
    stock: i64,
) -> Result<(), DbError> {
    validate_storefront_name(storefront)?;

    let sql = format!(
        "UPDATE {} SET stock = $1, updated_at = NOW() WHERE id = $2",
        qualified(storefront, "product_variants")
    );
    let result = sqlx::query(&sql)
        .bind(stock)
        .bind(variant_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Inserts a variant row, used by the catalog importer for newly created
/// products. Reconciliation never creates variants.
///
/// Returns the internal `id` of the new row.
///
/// # Errors
///
/// Returns [`DbError::InvalidStorefrontName`] or [`DbError::Sqlx`]
/// (including SKU uniqueness violations within the storefront).
pub async fn insert_variant(
    pool: &PgPool,
    storefront: &str,
    product_id: i64,
    variant: &NewVariant,
) -> Result<i64, DbError> {
    validate_storefront_name(storefront)?;

    let sql = format!(
        "INSERT INTO {} \
             (product_id, size, color, sku, stock, price_override, \
              shopify_inventory_item_id, images) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id",
        qualified(storefront, "product_variants")
    );
    let id: i64 = sqlx::query_scalar(&sql)
        .bind(product_id)
        .bind(&variant.size)
        .bind(&variant.color)
        .bind(&variant.sku)
        .bind(variant.stock)
        .bind(variant.price_override)
        .bind(&variant.shopify_inventory_item_id)
        .bind(&variant.images)
        .fetch_one(pool)
        .await?;

    Ok(id)
}

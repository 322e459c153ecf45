//! Database operations for the `shopify_items` raw mirror.
//!
//! `shopify_items` holds the last-seen external payload per Shopify product,
//! independent of storefront partitioning. It is the staging area from which
//! admin approval promotes products into per-storefront catalog entries, and
//! the haystack the inventory-level path scans to map an inventory item back
//! to a product.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use storesync_core::ExternalProduct;

use crate::DbError;

/// A row from `public.shopify_items`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShopifyItemRow {
    pub id: i64,
    /// Shopify product id as a string.
    pub shopify_id: String,
    pub title: Option<String>,
    pub handle: Option<String>,
    pub status: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub tags: Vec<String>,
    pub image_urls: Vec<String>,
    /// The full external payload as last received.
    pub raw_product: serde_json::Value,
    /// Saga completion log: storefronts whose sweep finished for the most
    /// recent product update.
    pub processed_storefronts: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const ITEM_COLUMNS: &str = "id, shopify_id, title, handle, status, vendor, product_type, \
     tags, image_urls, raw_product, processed_storefronts, created_at, updated_at";

fn raw_payload(product: &ExternalProduct) -> Result<serde_json::Value, DbError> {
    serde_json::to_value(product)
        .map_err(|e| DbError::Sqlx(sqlx::Error::Encode(Box::new(e))))
}

/// Upserts the mirror row for an external product, resetting the saga log.
/// Used by the importer, which owns row creation.
///
/// Returns the internal `id` of the upserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_shopify_item(
    pool: &PgPool,
    product: &ExternalProduct,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO shopify_items \
             (shopify_id, title, handle, status, vendor, product_type, tags, \
              image_urls, raw_product, processed_storefronts) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, '{}') \
         ON CONFLICT (shopify_id) DO UPDATE SET \
             title                 = EXCLUDED.title, \
             handle                = EXCLUDED.handle, \
             status                = EXCLUDED.status, \
             vendor                = EXCLUDED.vendor, \
             product_type          = EXCLUDED.product_type, \
             tags                  = EXCLUDED.tags, \
             image_urls            = EXCLUDED.image_urls, \
             raw_product           = EXCLUDED.raw_product, \
             processed_storefronts = '{}', \
             updated_at            = NOW() \
         RETURNING id",
    )
    .bind(product.id.to_string())
    .bind(&product.title)
    .bind(&product.handle)
    .bind(&product.status)
    .bind(&product.vendor)
    .bind(&product.product_type)
    .bind(product.tag_list())
    .bind(product.image_urls())
    .bind(raw_payload(product)?)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Refreshes an existing mirror row from a webhook payload.
///
/// Returns `false` when no row exists for the product — webhook processing
/// skips the mirror in that case rather than creating one, since row
/// creation belongs to the importer.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn touch_shopify_item(
    pool: &PgPool,
    product: &ExternalProduct,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE shopify_items SET \
             title                 = $2, \
             handle                = $3, \
             status                = $4, \
             vendor                = $5, \
             product_type          = $6, \
             tags                  = $7, \
             image_urls            = $8, \
             raw_product           = $9, \
             processed_storefronts = '{}', \
             updated_at            = NOW() \
         WHERE shopify_id = $1",
    )
    .bind(product.id.to_string())
    .bind(&product.title)
    .bind(&product.handle)
    .bind(&product.status)
    .bind(&product.vendor)
    .bind(&product.product_type)
    .bind(product.tag_list())
    .bind(product.image_urls())
    .bind(raw_payload(product)?)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Finds mirror rows whose stored payload contains a variant with the given
/// inventory item id, using jsonb containment on `raw_product.variants`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_items_with_inventory_item(
    pool: &PgPool,
    inventory_item_id: i64,
) -> Result<Vec<ShopifyItemRow>, DbError> {
    let needle = serde_json::json!([{ "inventory_item_id": inventory_item_id }]);

    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM shopify_items \
         WHERE raw_product->'variants' @> $1::jsonb \
         ORDER BY id"
    );
    let rows = sqlx::query_as::<_, ShopifyItemRow>(&sql)
        .bind(needle)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Appends a storefront to the mirror row's saga completion log, once.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_storefront_processed(
    pool: &PgPool,
    shopify_id: &str,
    storefront: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE shopify_items \
         SET processed_storefronts = array_append(processed_storefronts, $2) \
         WHERE shopify_id = $1 \
           AND NOT (processed_storefronts @> ARRAY[$2])",
    )
    .bind(shopify_id)
    .bind(storefront)
    .execute(pool)
    .await?;

    Ok(())
}

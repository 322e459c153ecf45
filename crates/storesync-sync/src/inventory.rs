//! The inventory-level reconciliation path.
//!
//! Triggered by `inventory_items/update` webhooks, which carry only an
//! inventory item id. The caller fetches the current levels from the Admin
//! API first; this module maps the id back to internal variants through the
//! raw mirror and writes the new stock count.

use futures::future::join_all;
use sqlx::PgPool;
use storesync_core::ExternalProduct;
use storesync_db::{
    find_items_with_inventory_item, find_products_by_source_id, list_variants,
    update_variant_stock,
};

use crate::matcher::collect_inventory_matches;
use crate::SyncError;

/// Writes `total_available` to every internal variant mapped to the given
/// inventory item. Returns the number of variants updated.
///
/// The mirror's stored payloads are the only map from inventory item id to
/// product; products never imported (no mirror row) yield zero updates,
/// which is success. Lookups run against the default storefront partition.
///
/// # Errors
///
/// Returns [`SyncError::Db`] if the mirror scan itself fails. Per-product
/// and per-variant failures are logged and skipped.
pub async fn apply_inventory_level_update(
    pool: &PgPool,
    total_available: i64,
    inventory_item_id: i64,
    default_storefront: &str,
) -> Result<usize, SyncError> {
    let items = find_items_with_inventory_item(pool, inventory_item_id).await?;
    if items.is_empty() {
        tracing::info!(inventory_item_id, "no mirrored product references this inventory item");
        return Ok(0);
    }

    let mut target_ids: Vec<i64> = Vec::new();
    for item in &items {
        let product: ExternalProduct = match serde_json::from_value(item.raw_product.clone()) {
            Ok(product) => product,
            Err(error) => {
                tracing::warn!(
                    shopify_id = %item.shopify_id,
                    error = %error,
                    "stored payload no longer deserializes, skipping"
                );
                continue;
            }
        };

        let externals: Vec<_> = product
            .variants
            .iter()
            .filter(|v| v.inventory_item_id == Some(inventory_item_id))
            .collect();
        if externals.is_empty() {
            continue;
        }

        let rows = match find_products_by_source_id(
            pool,
            default_storefront,
            &product.id.to_string(),
        )
        .await
        {
            Ok(rows) => rows,
            Err(error) => {
                tracing::error!(
                    shopify_id = %item.shopify_id,
                    error = %error,
                    "product lookup failed, skipping"
                );
                continue;
            }
        };

        for row in rows {
            let candidates = match list_variants(pool, default_storefront, row.id).await {
                Ok(candidates) => candidates,
                Err(error) => {
                    tracing::error!(
                        internal_id = row.id,
                        error = %error,
                        "variant listing failed, skipping"
                    );
                    continue;
                }
            };

            for external in &externals {
                for matched in collect_inventory_matches(external, &candidates) {
                    if !target_ids.contains(&matched.id) {
                        target_ids.push(matched.id);
                    }
                }
            }
        }
    }

    if target_ids.is_empty() {
        tracing::info!(inventory_item_id, "inventory item maps to no internal variant");
        return Ok(0);
    }

    let results = join_all(
        target_ids
            .iter()
            .map(|&id| update_variant_stock(pool, default_storefront, id, total_available)),
    )
    .await;

    let mut updated = 0;
    for (variant_id, result) in target_ids.iter().zip(results) {
        match result {
            Ok(()) => updated += 1,
            Err(error) => {
                tracing::error!(
                    variant_id,
                    error = %error,
                    "stock write failed, skipping"
                );
            }
        }
    }

    tracing::info!(inventory_item_id, total_available, updated, "inventory levels applied");
    Ok(updated)
}

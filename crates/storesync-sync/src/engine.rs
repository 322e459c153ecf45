//! The product-update reconciliation sweep.

use futures::future::join_all;
use sqlx::PgPool;
use storesync_core::ExternalProduct;
use storesync_db::{
    find_products_by_source_id, list_storefronts, list_variants, mark_storefront_processed,
    touch_shopify_item, update_product_sync_fields, update_variant_reconciled, ProductRow,
};

use crate::matcher::match_variant;
use crate::SyncError;

/// One internal product touched by a sweep, reported back to the webhook
/// handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedProduct {
    pub product_id: i64,
    pub storefront: String,
}

/// Applies a `products/update` payload across every storefront partition.
///
/// The sweep refreshes the raw mirror row, then visits each storefront,
/// updating the sync-owned fields of every product whose
/// `source_shopify_id` matches. Storefronts and products are processed
/// independently; a failure in one is logged and the rest continue.
/// Re-applying an identical payload writes the same values again, so the
/// operation is idempotent at the field level.
///
/// # Errors
///
/// Currently infallible in practice (all per-entity failures are absorbed),
/// but kept fallible so callers handle future hard failures uniformly.
pub async fn apply_product_update(
    pool: &PgPool,
    product: &ExternalProduct,
    default_storefront: &str,
) -> Result<Vec<UpdatedProduct>, SyncError> {
    refresh_mirror(pool, product).await;

    let storefronts = list_storefronts(pool, default_storefront).await;
    tracing::info!(
        product_id = product.id,
        storefronts = storefronts.len(),
        "applying product update"
    );

    let mut updated = Vec::new();
    for storefront in &storefronts {
        match sweep_storefront(pool, storefront, product).await {
            Ok(outcome) => {
                // Mark only clean sweeps so a retry revisits this partition.
                if outcome.clean {
                    if let Err(error) =
                        mark_storefront_processed(pool, &product.id.to_string(), storefront).await
                    {
                        tracing::warn!(
                            storefront,
                            error = %error,
                            "failed to record processed storefront"
                        );
                    }
                }
                updated.extend(outcome.updated);
            }
            Err(error) => {
                tracing::error!(
                    storefront,
                    product_id = product.id,
                    error = %error,
                    "storefront sweep failed, continuing with the rest"
                );
            }
        }
    }

    tracing::info!(
        product_id = product.id,
        updated = updated.len(),
        "product update applied"
    );
    Ok(updated)
}

/// Best-effort mirror refresh. A missing row means the product was never
/// imported; the sweep still runs so already-imported partitions stay
/// current.
async fn refresh_mirror(pool: &PgPool, product: &ExternalProduct) {
    match touch_shopify_item(pool, product).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!(product_id = product.id, "no mirror row, skipping refresh");
        }
        Err(error) => {
            tracing::warn!(product_id = product.id, error = %error, "mirror refresh failed");
        }
    }
}

struct SweepOutcome {
    updated: Vec<UpdatedProduct>,
    /// False when any product in the partition failed to reconcile; such a
    /// partition is not recorded in the saga log.
    clean: bool,
}

/// Updates every matching product in one storefront. An `Err` means the
/// partition could not even be scanned.
async fn sweep_storefront(
    pool: &PgPool,
    storefront: &str,
    product: &ExternalProduct,
) -> Result<SweepOutcome, SyncError> {
    let source_id = product.id.to_string();
    let rows = find_products_by_source_id(pool, storefront, &source_id).await?;
    if rows.is_empty() {
        tracing::debug!(storefront, product_id = product.id, "no products to reconcile");
        return Ok(SweepOutcome { updated: Vec::new(), clean: true });
    }

    let mut updated = Vec::new();
    let mut clean = true;
    for row in rows {
        match reconcile_product(pool, storefront, product, &row).await {
            Ok(()) => updated.push(UpdatedProduct {
                product_id: row.id,
                storefront: storefront.to_owned(),
            }),
            Err(error) => {
                clean = false;
                tracing::error!(
                    storefront,
                    internal_id = row.id,
                    error = %error,
                    "product reconciliation failed"
                );
            }
        }
    }

    Ok(SweepOutcome { updated, clean })
}

async fn reconcile_product(
    pool: &PgPool,
    storefront: &str,
    product: &ExternalProduct,
    row: &ProductRow,
) -> Result<(), SyncError> {
    // A malformed or absent price keeps the stored value; an empty image
    // list is not treated as a deletion.
    let base_price = product.base_price().unwrap_or(row.base_price);
    let external_images = product.image_urls();
    let images = if external_images.is_empty() {
        &row.images
    } else {
        &external_images
    };
    update_product_sync_fields(pool, storefront, row.id, base_price, images).await?;

    if product.variants.is_empty() {
        return Ok(());
    }

    let candidates = list_variants(pool, storefront, row.id).await?;
    let mut writes = Vec::new();
    for external in &product.variants {
        let Some(matched) = match_variant(external, &candidates) else {
            tracing::debug!(
                storefront,
                external_variant_id = external.id,
                "no matching variant, skipping"
            );
            continue;
        };
        // An override is only meaningful when it differs from the base
        // price; equal or unparseable prices clear any stale override.
        let price_override = external.parsed_price().filter(|price| *price != base_price);
        writes.push(VariantWrite {
            variant_id: matched.id,
            stock: external.stock(),
            price_override,
            images: variant_images(product, external.id),
        });
    }

    let results = join_all(writes.iter().map(|write| {
        update_variant_reconciled(
            pool,
            storefront,
            write.variant_id,
            write.stock,
            write.price_override,
            write.images.as_deref(),
        )
    }))
    .await;

    for (write, result) in writes.iter().zip(results) {
        if let Err(error) = result {
            tracing::error!(
                storefront,
                variant_id = write.variant_id,
                error = %error,
                "variant write failed, skipping"
            );
        }
    }

    Ok(())
}

struct VariantWrite {
    variant_id: i64,
    stock: i64,
    price_override: Option<rust_decimal::Decimal>,
    images: Option<Vec<String>>,
}

/// Image list for one variant: images tagged with the variant's id first,
/// then the general product shots, de-duplicated. `None` (no update) when
/// the payload carries no usable URLs at all.
fn variant_images(product: &ExternalProduct, external_variant_id: i64) -> Option<Vec<String>> {
    let tagged = product.image_urls_for_variant(external_variant_id);
    let general = product.image_urls();

    let mut merged = Vec::new();
    for url in tagged.into_iter().chain(general) {
        if !merged.contains(&url) {
            merged.push(url);
        }
    }

    if merged.is_empty() {
        None
    } else {
        Some(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(json: serde_json::Value) -> ExternalProduct {
        serde_json::from_value(json).expect("payload")
    }

    #[test]
    fn variant_images_prefer_tagged_then_general() {
        let p = product(serde_json::json!({
            "id": 1,
            "title": "T",
            "images": [
                {"id": 10, "src": "http://img/general.png"},
                {"id": 11, "src": "http://img/tagged.png", "variant_ids": [77]}
            ]
        }));
        assert_eq!(
            variant_images(&p, 77),
            Some(vec![
                "http://img/tagged.png".to_owned(),
                "http://img/general.png".to_owned()
            ])
        );
    }

    #[test]
    fn variant_images_fall_back_to_general_shots() {
        let p = product(serde_json::json!({
            "id": 1,
            "title": "T",
            "images": [{"id": 10, "src": "http://img/general.png"}]
        }));
        assert_eq!(
            variant_images(&p, 77),
            Some(vec!["http://img/general.png".to_owned()])
        );
    }

    #[test]
    fn variant_images_none_when_payload_has_no_urls() {
        let p = product(serde_json::json!({"id": 1, "title": "T"}));
        assert_eq!(variant_images(&p, 77), None);
    }

    #[test]
    fn variant_images_deduplicate_shared_urls() {
        let p = product(serde_json::json!({
            "id": 1,
            "title": "T",
            "images": [
                {"id": 10, "src": "http://img/shared.png", "variant_ids": [77]},
                {"id": 11, "src": "http://img/shared.png"}
            ]
        }));
        assert_eq!(
            variant_images(&p, 77),
            Some(vec!["http://img/shared.png".to_owned()])
        );
    }
}

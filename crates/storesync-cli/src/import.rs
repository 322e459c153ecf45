//! Catalog import command.
//!
//! Pulls the full product listing from the Shopify Admin API, mirrors every
//! payload into `shopify_items`, and creates internal products and variants
//! in the target storefront. Products that already exist there are refreshed
//! through the same reconciliation sweep the webhook path uses. Per-product
//! failures are logged and skipped rather than propagated so one bad payload
//! does not abort the full run.

use rust_decimal::Decimal;
use sqlx::PgPool;
use storesync_core::{AppConfig, ExternalProduct, ExternalVariant};
use storesync_db::{
    create_storefront, find_products_by_source_id, insert_variant, upsert_product,
    upsert_shopify_item, NewProduct, NewVariant,
};
use storesync_shopify::ShopifyClient;
use storesync_sync::apply_product_update;

const INTER_REQUEST_DELAY_MS: u64 = 500;

pub(crate) async fn run_import(
    pool: &PgPool,
    config: &AppConfig,
    storefront: &str,
    limit: u32,
    dry_run: bool,
) -> anyhow::Result<()> {
    let (Some(store_url), Some(access_token)) = (
        config.shopify_store_url.as_deref(),
        config.shopify_access_token.as_deref(),
    ) else {
        anyhow::bail!("SHOPIFY_STORE_URL and SHOPIFY_ACCESS_TOKEN are required for import");
    };

    let client = ShopifyClient::new(
        store_url,
        access_token,
        config.shopify_request_timeout_secs,
        config.shopify_max_retries,
        config.shopify_retry_backoff_base_ms,
    )?;

    let products = client
        .fetch_all_products(limit.clamp(1, 250), INTER_REQUEST_DELAY_MS)
        .await?;
    println!("fetched {} products from {store_url}", products.len());

    if dry_run {
        for product in &products {
            println!(
                "dry-run: would import {} ({} variants) as '{}'",
                product.title,
                product.variants.len(),
                product_slug(product)
            );
        }
        return Ok(());
    }

    create_storefront(pool, storefront).await?;

    let mut created = 0usize;
    let mut refreshed = 0usize;
    let mut failed = 0usize;
    for product in &products {
        match import_product(pool, storefront, config, product).await {
            Ok(true) => created += 1,
            Ok(false) => refreshed += 1,
            Err(error) => {
                failed += 1;
                eprintln!("error: import failed for '{}': {error}", product.title);
                tracing::error!(product_id = product.id, error = %error, "import failed");
            }
        }
    }

    println!("import complete: {created} created, {refreshed} refreshed, {failed} failed");
    Ok(())
}

/// Imports one product. Returns `true` when a new internal product was
/// created, `false` when an existing one was refreshed.
async fn import_product(
    pool: &PgPool,
    storefront: &str,
    config: &AppConfig,
    product: &ExternalProduct,
) -> anyhow::Result<bool> {
    upsert_shopify_item(pool, product).await?;

    let existing = find_products_by_source_id(pool, storefront, &product.id.to_string()).await?;
    if !existing.is_empty() {
        apply_product_update(pool, product, &config.default_storefront).await?;
        return Ok(false);
    }

    let product_id = upsert_product(pool, storefront, &new_product(product)).await?;
    for variant in &product.variants {
        insert_variant(pool, storefront, product_id, &new_variant(product, variant)).await?;
    }
    Ok(true)
}

fn new_product(product: &ExternalProduct) -> NewProduct {
    NewProduct {
        name: product.title.clone(),
        slug: product_slug(product),
        category: product.product_type.clone(),
        base_price: product.base_price().unwrap_or(Decimal::ZERO),
        images: product.image_urls(),
        source_shopify_id: Some(product.id.to_string()),
        is_active: product.status.as_deref() == Some("active"),
    }
}

fn new_variant(product: &ExternalProduct, variant: &ExternalVariant) -> NewVariant {
    // Same override rule as the reconciliation sweep: only a price that
    // differs from the product's base price is stored.
    let price_override = variant
        .parsed_price()
        .filter(|price| Some(*price) != product.base_price());
    NewVariant {
        size: variant.size_token().map(ToOwned::to_owned),
        color: None,
        sku: variant.sku.as_deref().filter(|s| !s.is_empty()).map(ToOwned::to_owned),
        stock: variant.stock(),
        price_override,
        shopify_inventory_item_id: variant.inventory_item_id.map(|id| id.to_string()),
        images: product.image_urls_for_variant(variant.id),
    }
}

/// Slug for the internal product: the Shopify handle when present, otherwise
/// derived from the title.
fn product_slug(product: &ExternalProduct) -> String {
    product
        .handle
        .as_deref()
        .filter(|h| !h.trim().is_empty())
        .map_or_else(|| slugify(&product.title), ToOwned::to_owned)
}

fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_was_dash = true;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

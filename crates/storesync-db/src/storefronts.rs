//! Storefront partition discovery and provisioning.
//!
//! Each storefront is a Postgres schema holding `products` and
//! `product_variants` tables. Enumeration probes candidate schemas for a
//! populated products table so the reconciliation sweep visits every
//! partition an external product may have been imported into.

use sqlx::PgPool;

use crate::{qualified, validate_storefront_name, DbError};

/// Root namespaces that are never storefront partitions: Postgres system
/// schemas, the shared `public` schema (raw mirror), and the legacy
/// root-collection names from the pre-partitioning layout.
const EXCLUDED_SCHEMAS: &[&str] = &[
    "pg_catalog",
    "information_schema",
    "pg_toast",
    "public",
    "orders",
    "carts",
    "users",
    "user_events",
];

/// Enumerates storefront partitions.
///
/// A schema qualifies when it contains a `products` table with at least one
/// row, or it is the configured default storefront. On enumeration failure
/// the default storefront is assumed; the result is never empty.
pub async fn list_storefronts(pool: &PgPool, default_storefront: &str) -> Vec<String> {
    match try_list_storefronts(pool, default_storefront).await {
        Ok(storefronts) if !storefronts.is_empty() => storefronts,
        Ok(_) => vec![default_storefront.to_owned()],
        Err(error) => {
            tracing::error!(error = %error, "storefront enumeration failed, assuming default");
            vec![default_storefront.to_owned()]
        }
    }
}

async fn try_list_storefronts(
    pool: &PgPool,
    default_storefront: &str,
) -> Result<Vec<String>, DbError> {
    let schemas: Vec<String> = sqlx::query_scalar(
        "SELECT schema_name FROM information_schema.schemata ORDER BY schema_name",
    )
    .fetch_all(pool)
    .await?;

    let mut storefronts = Vec::new();
    for schema in schemas {
        if EXCLUDED_SCHEMAS.contains(&schema.as_str()) || schema.starts_with("pg_") {
            continue;
        }
        // Schemas created outside this system may carry arbitrary names;
        // anything that fails identifier validation cannot be probed safely.
        if validate_storefront_name(&schema).is_err() {
            continue;
        }

        if schema == default_storefront || has_products(pool, &schema).await {
            storefronts.push(schema);
        }
    }

    Ok(storefronts)
}

/// Probes whether `<schema>.products` exists and holds at least one row.
/// Probe failures disqualify the candidate rather than aborting enumeration.
async fn has_products(pool: &PgPool, schema: &str) -> bool {
    let regclass: Result<Option<String>, sqlx::Error> =
        sqlx::query_scalar("SELECT to_regclass($1)::text")
            .bind(qualified(schema, "products"))
            .fetch_one(pool)
            .await;

    match regclass {
        Ok(Some(_)) => {}
        Ok(None) => return false,
        Err(error) => {
            tracing::debug!(schema, error = %error, "storefront probe failed, skipping");
            return false;
        }
    }

    let sql = format!(
        "SELECT EXISTS (SELECT 1 FROM {} LIMIT 1)",
        qualified(schema, "products")
    );
    match sqlx::query_scalar::<_, bool>(&sql).fetch_one(pool).await {
        Ok(populated) => populated,
        Err(error) => {
            tracing::debug!(schema, error = %error, "storefront probe failed, skipping");
            false
        }
    }
}

/// Provisions a storefront partition: schema, tables, and indexes.
///
/// Idempotent — all DDL uses `IF NOT EXISTS`, so re-provisioning an existing
/// storefront is a no-op.
///
/// # Errors
///
/// Returns [`DbError::InvalidStorefrontName`] for an unusable name, or
/// [`DbError::Sqlx`] if any DDL statement fails (the batch is rolled back).
pub async fn create_storefront(pool: &PgPool, name: &str) -> Result<(), DbError> {
    validate_storefront_name(name)?;

    let products = qualified(name, "products");
    let variants = qualified(name, "product_variants");

    let statements = [
        format!("CREATE SCHEMA IF NOT EXISTS \"{name}\""),
        format!(
            "CREATE TABLE IF NOT EXISTS {products} ( \
                 id BIGSERIAL PRIMARY KEY, \
                 name TEXT NOT NULL, \
                 slug TEXT NOT NULL UNIQUE, \
                 category TEXT, \
                 base_price NUMERIC(10,2) NOT NULL DEFAULT 0, \
                 images TEXT[] NOT NULL DEFAULT '{{}}', \
                 source_shopify_id TEXT, \
                 is_active BOOLEAN NOT NULL DEFAULT TRUE, \
                 view_count BIGINT NOT NULL DEFAULT 0, \
                 purchase_count BIGINT NOT NULL DEFAULT 0, \
                 created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(), \
                 updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW() \
             )"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS products_source_shopify_id_idx \
             ON {products} (source_shopify_id)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {variants} ( \
                 id BIGSERIAL PRIMARY KEY, \
                 product_id BIGINT NOT NULL REFERENCES {products} (id) ON DELETE CASCADE, \
                 size TEXT, \
                 color TEXT, \
                 sku TEXT, \
                 stock BIGINT NOT NULL DEFAULT 0, \
                 price_override NUMERIC(10,2), \
                 shopify_inventory_item_id TEXT, \
                 images TEXT[] NOT NULL DEFAULT '{{}}', \
                 purchase_count BIGINT NOT NULL DEFAULT 0, \
                 created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(), \
                 updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW() \
             )"
        ),
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS product_variants_sku_idx \
             ON {variants} (sku) WHERE sku IS NOT NULL"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS product_variants_product_id_idx \
             ON {variants} (product_id)"
        ),
    ];

    let mut tx = pool.begin().await?;
    for statement in &statements {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    Ok(())
}

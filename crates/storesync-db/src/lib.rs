use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/storesync-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &storesync_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error("record not found")]
    NotFound,
    #[error("invalid storefront name: {0:?}")]
    InvalidStorefrontName(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Connect to a Postgres pool, reading `DATABASE_URL` from env.
///
/// # Errors
///
/// Returns [`DbError::MissingDatabaseUrl`] if `DATABASE_URL` is unset, or
/// [`DbError::Sqlx`] if the connection cannot be established.
pub async fn connect_pool_from_env() -> Result<PgPool, DbError> {
    let database_url = env::var("DATABASE_URL").map_err(|_| DbError::MissingDatabaseUrl)?;
    connect_pool(&database_url, PoolConfig::default())
        .await
        .map_err(DbError::from)
}

/// Run all pending migrations against the pool.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Run a full health check: ping the pool and return a typed error on failure.
///
/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}

/// Validates a storefront partition name before it is interpolated into SQL
/// as a schema identifier.
///
/// Accepted: a lowercase ASCII letter followed by lowercase letters, digits,
/// or underscores, at most 63 bytes (the Postgres identifier limit).
///
/// # Errors
///
/// Returns [`DbError::InvalidStorefrontName`] for anything else.
pub fn validate_storefront_name(name: &str) -> Result<(), DbError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            name.len() <= 63
                && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(DbError::InvalidStorefrontName(name.to_owned()))
    }
}

/// Returns the quoted, schema-qualified form of a table name for a validated
/// storefront, e.g. `"lunera".products`.
pub(crate) fn qualified(storefront: &str, table: &str) -> String {
    format!("\"{storefront}\".{table}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_config_has_sane_defaults() {
        let config = PoolConfig::default();

        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.min_connections, DEFAULT_MIN_CONNECTIONS);
        assert_eq!(config.acquire_timeout_secs, DEFAULT_ACQUIRE_TIMEOUT_SECS);
    }

    #[test]
    fn validate_storefront_name_accepts_simple_names() {
        assert!(validate_storefront_name("lunera").is_ok());
        assert!(validate_storefront_name("store_2").is_ok());
    }

    #[test]
    fn validate_storefront_name_rejects_injection_shapes() {
        for bad in [
            "",
            "LUNERA",
            "1store",
            "store-2",
            "public\"; DROP TABLE products; --",
            "store name",
        ] {
            assert!(
                matches!(
                    validate_storefront_name(bad),
                    Err(DbError::InvalidStorefrontName(_))
                ),
                "should reject {bad:?}"
            );
        }
    }

    #[test]
    fn qualified_quotes_schema() {
        assert_eq!(qualified("lunera", "products"), "\"lunera\".products");
    }
}

pub mod products;
pub mod shopify_items;
pub mod storefronts;
pub mod variants;

pub use products::{
    find_products_by_source_id, update_product_sync_fields, upsert_product, NewProduct, ProductRow,
};
pub use shopify_items::{
    find_items_with_inventory_item, mark_storefront_processed, touch_shopify_item,
    upsert_shopify_item, ShopifyItemRow,
};
pub use storefronts::{create_storefront, list_storefronts};
pub use variants::{
    insert_variant, list_variants, update_variant_reconciled, update_variant_stock, NewVariant,
    VariantRow,
};

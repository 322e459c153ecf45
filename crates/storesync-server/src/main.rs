mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = storesync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = storesync_db::PoolConfig::from_app_config(&config);
    let pool = storesync_db::connect_pool(&config.database_url, pool_config).await?;
    storesync_db::run_migrations(&pool).await?;

    let shopify = build_shopify_client(&config)?;
    if shopify.is_none() {
        tracing::warn!(
            "SHOPIFY_STORE_URL / SHOPIFY_ACCESS_TOKEN not set; \
             inventory webhooks will acknowledge without fetching levels"
        );
    }
    if config.shopify_webhook_secret.is_none() {
        tracing::warn!("SHOPIFY_WEBHOOK_SECRET not set; all webhook deliveries will be rejected");
    }

    let app = build_app(AppState {
        pool,
        shopify,
        webhook_secret: config.shopify_webhook_secret.clone(),
        default_storefront: config.default_storefront.clone(),
    });

    tracing::info!(addr = %config.bind_addr, env = %config.env, "starting webhook server");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn build_shopify_client(
    config: &storesync_core::AppConfig,
) -> anyhow::Result<Option<Arc<storesync_shopify::ShopifyClient>>> {
    let (Some(store_url), Some(access_token)) = (
        config.shopify_store_url.as_deref(),
        config.shopify_access_token.as_deref(),
    ) else {
        return Ok(None);
    };

    let client = storesync_shopify::ShopifyClient::new(
        store_url,
        access_token,
        config.shopify_request_timeout_secs,
        config.shopify_max_retries,
        config.shopify_retry_backoff_base_ms,
    )?;
    Ok(Some(Arc::new(client)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}

mod webhooks;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;
use storesync_shopify::ShopifyClient;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::request_id;

/// Shared handler state, constructed once at startup and passed by axum
/// state. `shopify` is `None` when Admin API credentials are absent; the
/// inventory path then acknowledges deliveries without fetching levels.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub shopify: Option<Arc<ShopifyClient>>,
    pub webhook_secret: Option<String>,
    pub default_storefront: String,
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(storesync_shopify::webhook::HMAC_HEADER),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route(
            "/api/shopify/webhooks/products-update",
            get(webhooks::products_update_probe).post(webhooks::products_update),
        )
        .route(
            "/api/shopify/webhooks/inventory-item-update",
            get(webhooks::inventory_item_update_probe).post(webhooks::inventory_item_update),
        )
        .route(
            "/api/shopify/webhooks/inventory-update",
            get(webhooks::inventory_update_gone).post(webhooks::inventory_update_gone),
        )
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match storesync_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({"status": "ok", "database": "ok"})),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "degraded", "database": "unavailable"})),
            )
        }
    }
}

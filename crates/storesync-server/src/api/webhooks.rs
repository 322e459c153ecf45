//! Shopify webhook handlers.
//!
//! Signature verification runs over the raw body bytes before any JSON
//! parsing. After a delivery authenticates, payload problems and upstream
//! failures are acknowledged with soft 200 responses so Shopify does not
//! retry deliveries that will never succeed; only engine failures surface
//! as 500.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use storesync_core::ExternalProduct;
use storesync_shopify::webhook;
use storesync_sync::{apply_inventory_level_update, apply_product_update};

use super::AppState;

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Unauthorized"})),
    )
        .into_response()
}

fn processing_failed(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "Webhook processing failed",
            "message": message,
        })),
    )
        .into_response()
}

/// Verifies the delivery's HMAC digest. An unconfigured secret rejects
/// everything; accepting unsigned deliveries would let anyone mutate the
/// catalog.
fn authorize(secret: Option<&str>, headers: &HeaderMap, body: &[u8]) -> Result<(), Response> {
    let Some(secret) = secret else {
        tracing::error!("webhook secret not configured, rejecting delivery");
        return Err(unauthorized());
    };

    let provided = headers
        .get(webhook::HMAC_HEADER)
        .and_then(|v| v.to_str().ok());
    match provided {
        Some(digest) if webhook::verify_webhook(body, digest, secret) => Ok(()),
        Some(_) => {
            tracing::warn!("webhook signature mismatch");
            Err(unauthorized())
        }
        None => {
            tracing::warn!(header = webhook::HMAC_HEADER, "webhook digest header missing");
            Err(unauthorized())
        }
    }
}

pub async fn products_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(response) = authorize(state.webhook_secret.as_deref(), &headers, &body) {
        return response;
    }

    let product: ExternalProduct = match serde_json::from_slice(&body) {
        Ok(product) => product,
        Err(error) => {
            tracing::error!(error = %error, "products/update payload failed to parse");
            return processing_failed(&error.to_string());
        }
    };

    match apply_product_update(&state.pool, &product, &state.default_storefront).await {
        Ok(updated) => {
            tracing::info!(product_id = product.id, updated = updated.len(), "products/update applied");
            (
                StatusCode::OK,
                Json(json!({"ok": true, "productId": product.id})),
            )
                .into_response()
        }
        Err(error) => {
            tracing::error!(product_id = product.id, error = %error, "products/update failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "ok": false,
                    "error": "Webhook processing failed",
                    "message": error.to_string(),
                })),
            )
                .into_response()
        }
    }
}

pub async fn products_update_probe() -> Response {
    (
        StatusCode::OK,
        Json(json!({"message": "products/update webhook endpoint is active"})),
    )
        .into_response()
}

pub async fn inventory_item_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(response) = authorize(state.webhook_secret.as_deref(), &headers, &body) {
        return response;
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(error) => {
            tracing::error!(error = %error, "inventory_items/update payload failed to parse");
            return processing_failed(&error.to_string());
        }
    };

    let Some(inventory_item_id) = extract_inventory_item_id(&payload) else {
        tracing::warn!("inventory_items/update payload carried no inventory item id");
        return (
            StatusCode::OK,
            Json(json!({"ok": false, "message": "Missing inventory item id"})),
        )
            .into_response();
    };

    let Some(shopify) = state.shopify.as_ref() else {
        tracing::warn!(inventory_item_id, "Admin client not configured; skipping level fetch");
        return (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "inventory_item_id": inventory_item_id,
                "message": "Shopify Admin client not configured; inventory levels not fetched",
            })),
        )
            .into_response();
    };

    let levels = match shopify.fetch_inventory_levels(inventory_item_id).await {
        Ok(Some(levels)) => levels,
        Ok(None) => {
            tracing::info!(inventory_item_id, "no inventory levels reported");
            return (
                StatusCode::OK,
                Json(json!({
                    "ok": true,
                    "inventory_item_id": inventory_item_id,
                    "message": "No inventory levels found for item",
                })),
            )
                .into_response();
        }
        Err(error) => {
            tracing::warn!(inventory_item_id, error = %error, "inventory level fetch failed");
            return (
                StatusCode::OK,
                Json(json!({
                    "ok": true,
                    "inventory_item_id": inventory_item_id,
                    "message": "Failed to fetch inventory levels; no update applied",
                })),
            )
                .into_response();
        }
    };

    match apply_inventory_level_update(
        &state.pool,
        levels.total_available,
        inventory_item_id,
        &state.default_storefront,
    )
    .await
    {
        Ok(0) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "inventory_item_id": inventory_item_id,
                "totalAvailable": levels.total_available,
                "message": "No matching variants for inventory item",
            })),
        )
            .into_response(),
        Ok(updated) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "inventory_item_id": inventory_item_id,
                "totalAvailable": levels.total_available,
                "updatedVariants": updated,
            })),
        )
            .into_response(),
        Err(error) => {
            tracing::error!(inventory_item_id, error = %error, "inventory_items/update failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "ok": false,
                    "error": "Webhook processing failed",
                    "message": error.to_string(),
                })),
            )
                .into_response()
        }
    }
}

pub async fn inventory_item_update_probe() -> Response {
    (
        StatusCode::OK,
        Json(json!({"message": "inventory_items/update webhook endpoint is active"})),
    )
        .into_response()
}

/// The legacy `inventory_levels/update` route. Level payloads carry
/// per-location deltas that cannot be applied safely without the aggregate,
/// so the route is permanently gone.
pub async fn inventory_update_gone() -> Response {
    (
        StatusCode::GONE,
        Json(json!({
            "error": "This endpoint is deprecated",
            "message": "Subscribe inventory_items/update to /api/shopify/webhooks/inventory-item-update",
        })),
    )
        .into_response()
}

/// The id arrives at the payload root for `inventory_items/update` and
/// nested under `inventory_item` for some delivery shapes; numeric and
/// numeric-string forms both occur.
fn extract_inventory_item_id(payload: &serde_json::Value) -> Option<i64> {
    value_as_i64(payload.get("id"))
        .or_else(|| value_as_i64(payload.pointer("/inventory_item/id")))
}

fn value_as_i64(value: Option<&serde_json::Value>) -> Option<i64> {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Correlation id for one webhook delivery, carried as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Tags every request with an id for log correlation.
///
/// A caller-supplied `x-request-id` header wins so Shopify delivery ids can
/// flow through; otherwise a fresh UUIDv4 is minted. The id lands in the
/// request extensions as [`RequestId`] and is echoed back on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

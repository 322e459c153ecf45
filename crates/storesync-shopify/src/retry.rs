//! Retry with exponential back-off and jitter for Admin API calls.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors (network failures, 429, 5xx). Non-transient errors are
//! returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ShopifyError;

/// Returns `true` for errors worth retrying after a back-off delay.
///
/// **Retriable:** network-level failures (timeout, connection reset),
/// HTTP 429, and HTTP 5xx.
///
/// **Not retriable:** other 4xx statuses, deserialization failures,
/// pagination-limit and store-URL errors — retrying won't fix them.
pub(crate) fn is_retriable(err: &ShopifyError) -> bool {
    match err {
        ShopifyError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ShopifyError::RateLimited { .. } => true,
        ShopifyError::UnexpectedStatus { status, .. } => *status >= 500,
        ShopifyError::Deserialize { .. }
        | ShopifyError::PaginationLimit { .. }
        | ShopifyError::InvalidStoreUrl { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient
/// errors.
///
/// The delay before the n-th retry is `backoff_base_ms * 2^(n-1)` with ±25%
/// jitter, capped at 60s. Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ShopifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ShopifyError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "Shopify transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deserialize_err() -> ShopifyError {
        let src = serde_json::from_str::<()>("invalid").unwrap_err();
        ShopifyError::Deserialize {
            context: "test".to_owned(),
            source: src,
        }
    }

    #[test]
    fn rate_limited_is_retriable() {
        assert!(is_retriable(&ShopifyError::RateLimited {
            store: "x.myshopify.com".to_owned(),
            retry_after_secs: 2,
        }));
    }

    #[test]
    fn server_error_status_is_retriable() {
        assert!(is_retriable(&ShopifyError::UnexpectedStatus {
            status: 503,
            url: "u".to_owned(),
        }));
    }

    #[test]
    fn client_error_status_is_not_retriable() {
        assert!(!is_retriable(&ShopifyError::UnexpectedStatus {
            status: 404,
            url: "u".to_owned(),
        }));
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        assert!(!is_retriable(&deserialize_err()));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ShopifyError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn does_not_retry_deserialize_errors() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(deserialize_err())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ShopifyError::Deserialize { .. })));
    }

    #[tokio::test]
    async fn retries_rate_limit_then_succeeds() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err::<u32, _>(ShopifyError::RateLimited {
                        store: "x".to_owned(),
                        retry_after_secs: 0,
                    })
                } else {
                    Ok(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}

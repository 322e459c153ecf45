use thiserror::Error;

/// Errors returned by the Shopify Admin API client.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// HTTP 429 after all retries were exhausted.
    #[error("rate limited by {store} (retry after {retry_after_secs}s)")]
    RateLimited { store: String, retry_after_secs: u64 },

    /// Any other non-2xx HTTP status.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// Page-follow loop exceeded the safety limit.
    #[error("pagination limit reached for {store}: exceeded {max_pages} pages")]
    PaginationLimit { store: String, max_pages: usize },

    /// The configured store URL could not be turned into a base URL.
    #[error("invalid store URL \"{store_url}\": {reason}")]
    InvalidStoreUrl { store_url: String, reason: String },
}

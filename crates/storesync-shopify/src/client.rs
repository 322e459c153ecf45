//! HTTP client for the Shopify Admin REST API.
//!
//! Authenticates with a static access token (`X-Shopify-Access-Token`)
//! against a fixed API version. Transient failures (429, 5xx, network) are
//! retried with exponential back-off; pagination cursors come from the
//! `Link` response header.

use std::time::Duration;

use reqwest::header::{HeaderValue, LINK};
use reqwest::{Client, StatusCode};
use storesync_core::ExternalProduct;

use crate::error::ShopifyError;
use crate::pagination::extract_next_cursor;
use crate::retry::retry_with_backoff;
use crate::types::{InventoryLevels, InventoryLevelsResponse, ProductsPage};

/// Admin API version all requests target.
pub const API_VERSION: &str = "2025-01";

/// Maximum number of product pages to follow before returning an error.
/// Prevents infinite loops on cycling cursors.
const MAX_PAGES: usize = 200;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Client for the Shopify Admin REST API.
///
/// Use [`ShopifyClient::new`] with the store domain for production, or
/// [`ShopifyClient::with_base_url`] to point at a mock server in tests.
pub struct ShopifyClient {
    client: Client,
    base_url: String,
    access_token: String,
    store: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl ShopifyClient {
    /// Creates a client for `store_url` (a bare domain such as
    /// `"example.myshopify.com"`; a scheme prefix is tolerated).
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::InvalidStoreUrl`] if the domain is empty and
    /// [`ShopifyError::Http`] if the underlying `reqwest::Client` cannot be
    /// constructed.
    pub fn new(
        store_url: &str,
        access_token: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ShopifyError> {
        let domain = store_url
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        if domain.is_empty() {
            return Err(ShopifyError::InvalidStoreUrl {
                store_url: store_url.to_owned(),
                reason: "empty store domain".to_owned(),
            });
        }

        Self::with_base_url(
            &format!("https://{domain}"),
            access_token,
            timeout_secs,
            max_retries,
            backoff_base_ms,
        )
    }

    /// Creates a client with an explicit base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        base_url: &str,
        access_token: &str,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ShopifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("storesync/0.1 (catalog-sync)")
            .build()?;

        let base_url = base_url.trim_end_matches('/').to_owned();
        let store = base_url
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .to_owned();

        Ok(Self {
            client,
            base_url,
            access_token: access_token.to_owned(),
            store,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Fetches current inventory levels for one inventory item, aggregated
    /// across locations.
    ///
    /// Returns `Ok(None)` when Shopify reports no levels for the item —
    /// callers treat that the same as a degraded fetch and skip the update.
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::RateLimited`] — HTTP 429 after all retries.
    /// - [`ShopifyError::UnexpectedStatus`] — any other non-2xx status.
    /// - [`ShopifyError::Http`] — network failure after all retries.
    /// - [`ShopifyError::Deserialize`] — response body is not the expected shape.
    pub async fn fetch_inventory_levels(
        &self,
        inventory_item_id: i64,
    ) -> Result<Option<InventoryLevels>, ShopifyError> {
        let url = format!(
            "{}/admin/api/{API_VERSION}/inventory_levels.json?inventory_item_ids={inventory_item_id}",
            self.base_url
        );

        let (body, _) = self.request_json(&url).await?;
        let response: InventoryLevelsResponse =
            serde_json::from_str(&body).map_err(|e| ShopifyError::Deserialize {
                context: format!("inventory_levels(inventory_item_id={inventory_item_id})"),
                source: e,
            })?;

        if response.inventory_levels.is_empty() {
            return Ok(None);
        }

        Ok(Some(InventoryLevels::from_levels(response.inventory_levels)))
    }

    /// Fetches one page of the Admin product listing.
    ///
    /// Returns the parsed page and the cursor for the next page, extracted
    /// from the `Link` response header (`None` on the last page).
    ///
    /// # Errors
    ///
    /// Same classes as [`Self::fetch_inventory_levels`].
    pub async fn fetch_products_page(
        &self,
        limit: u32,
        page_info: Option<&str>,
    ) -> Result<(ProductsPage, Option<String>), ShopifyError> {
        let mut url = format!(
            "{}/admin/api/{API_VERSION}/products.json?limit={limit}",
            self.base_url
        );
        if let Some(cursor) = page_info {
            url.push_str("&page_info=");
            url.push_str(cursor);
        }

        let (body, link_header) = self.request_json(&url).await?;
        let page: ProductsPage =
            serde_json::from_str(&body).map_err(|e| ShopifyError::Deserialize {
                context: format!("products(page_info={page_info:?})"),
                source: e,
            })?;

        Ok((page, extract_next_cursor(link_header.as_deref())))
    }

    /// Fetches the full product catalog by following `Link` cursors until no
    /// `rel="next"` page remains.
    ///
    /// **All-or-nothing semantics**: on any page failure the products already
    /// fetched are discarded and the error is returned, so callers never see
    /// a silently truncated catalog.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::fetch_products_page`]. Returns
    /// [`ShopifyError::PaginationLimit`] after `MAX_PAGES` pages.
    pub async fn fetch_all_products(
        &self,
        limit: u32,
        inter_request_delay_ms: u64,
    ) -> Result<Vec<ExternalProduct>, ShopifyError> {
        let mut all_products: Vec<ExternalProduct> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut is_first_page = true;
        let mut page_count = 0usize;

        loop {
            page_count += 1;
            if page_count > MAX_PAGES {
                return Err(ShopifyError::PaginationLimit {
                    store: self.store.clone(),
                    max_pages: MAX_PAGES,
                });
            }

            if !is_first_page && inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(inter_request_delay_ms)).await;
            }
            is_first_page = false;

            let (page, next) = self.fetch_products_page(limit, cursor.as_deref()).await?;
            all_products.extend(page.products);

            cursor = next;
            if cursor.is_none() {
                break;
            }
        }

        Ok(all_products)
    }

    /// Sends an authenticated GET, asserts a 2xx status, and returns the body
    /// text plus the `Link` header. Retries transient failures.
    async fn request_json(&self, url: &str) -> Result<(String, Option<String>), ShopifyError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async {
            let response = self
                .client
                .get(url)
                .header(ACCESS_TOKEN_HEADER, &self.access_token)
                .send()
                .await?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .unwrap_or(2);
                return Err(ShopifyError::RateLimited {
                    store: self.store.clone(),
                    retry_after_secs,
                });
            }
            if !status.is_success() {
                return Err(ShopifyError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_owned(),
                });
            }

            let link_header = response
                .headers()
                .get(LINK)
                .and_then(|v: &HeaderValue| v.to_str().ok())
                .map(ToOwned::to_owned);
            let body = response.text().await?;
            Ok((body, link_header))
        })
        .await
    }
}

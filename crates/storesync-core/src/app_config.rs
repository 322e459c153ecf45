use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Storefront partition used when enumeration falls back and as the
    /// scope for inventory-level reconciliation.
    pub default_storefront: String,
    pub shopify_webhook_secret: Option<String>,
    /// Store domain, e.g. `"my-shop.myshopify.com"`, without scheme.
    pub shopify_store_url: Option<String>,
    pub shopify_access_token: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub shopify_request_timeout_secs: u64,
    pub shopify_max_retries: u32,
    pub shopify_retry_backoff_base_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("default_storefront", &self.default_storefront)
            .field("database_url", &"[redacted]")
            .field(
                "shopify_webhook_secret",
                &self.shopify_webhook_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("shopify_store_url", &self.shopify_store_url)
            .field(
                "shopify_access_token",
                &self.shopify_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "shopify_request_timeout_secs",
                &self.shopify_request_timeout_secs,
            )
            .field("shopify_max_retries", &self.shopify_max_retries)
            .field(
                "shopify_retry_backoff_base_ms",
                &self.shopify_retry_backoff_base_ms,
            )
            .finish()
    }
}

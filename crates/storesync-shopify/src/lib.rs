//! Shopify Admin API client and webhook authentication.
//!
//! Two concerns live here: verifying that an inbound webhook genuinely came
//! from Shopify ([`webhook`]), and reading back authoritative state from the
//! Admin REST API ([`ShopifyClient`]) — inventory levels by item id and the
//! paginated product list used by the catalog importer.

mod client;
mod error;
mod pagination;
mod retry;
mod types;
pub mod webhook;

pub use client::ShopifyClient;
pub use error::ShopifyError;
pub use pagination::extract_next_cursor;
pub use types::{InventoryLevel, InventoryLevels, ProductsPage};

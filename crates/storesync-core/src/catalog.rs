//! Normalized Shopify product payload types.
//!
//! These model the product JSON delivered by Shopify's `products/update`
//! webhook and the Admin REST `products.json` endpoint, which share a shape.
//!
//! ## Observed payload quirks
//!
//! - `tags` is a single comma-joined string (`"new, sale ,featured"`), not an
//!   array; [`ExternalProduct::tag_list`] splits and trims it.
//! - `price` and `compare_at_price` are decimal strings (`"42.50"`), `null`
//!   when unset. Never floats; [`parse_price`] converts to [`Decimal`].
//! - `inventory_quantity` may be absent or `null`; treated as 0 at use sites.
//! - `images[].variant_ids` lists the variant ids an image is associated
//!   with; usually empty for general product shots.
//! - Option slots (`option1`..`option3`) are free text used inconsistently
//!   for size, color, or material. The first non-empty slot is treated as
//!   the size token for attribute matching; see
//!   [`ExternalVariant::size_token`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Storefront partition assumed when none can be enumerated.
pub const DEFAULT_STOREFRONT: &str = "lunera";

/// A product as reported by Shopify. Read-only within the reconciliation
/// path; this system never creates or deletes catalog entries from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalProduct {
    /// Shopify numeric product ID.
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub handle: Option<String>,
    /// `"active"`, `"archived"`, or `"draft"`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    /// Comma-joined tag string, exactly as Shopify sends it.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub variants: Vec<ExternalVariant>,
    #[serde(default)]
    pub images: Vec<ExternalImage>,
}

/// A purchasable variant nested in an [`ExternalProduct`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalVariant {
    /// Shopify numeric variant ID.
    pub id: i64,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub option1: Option<String>,
    #[serde(default)]
    pub option2: Option<String>,
    #[serde(default)]
    pub option3: Option<String>,
    /// Decimal price string, e.g. `"42.50"`.
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
    #[serde(default)]
    pub inventory_item_id: Option<i64>,
    #[serde(default)]
    pub image_id: Option<i64>,
}

/// A product image, optionally associated with specific variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalImage {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub variant_ids: Vec<i64>,
}

impl ExternalProduct {
    /// Returns all non-empty image URLs in payload order.
    #[must_use]
    pub fn image_urls(&self) -> Vec<String> {
        self.images
            .iter()
            .filter_map(|img| img.src.as_deref())
            .filter(|src| !src.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }

    /// Returns the URLs of images explicitly tagged with `variant_id`.
    #[must_use]
    pub fn image_urls_for_variant(&self, variant_id: i64) -> Vec<String> {
        self.images
            .iter()
            .filter(|img| img.variant_ids.contains(&variant_id))
            .filter_map(|img| img.src.as_deref())
            .filter(|src| !src.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }

    /// Splits the comma-joined tag string into trimmed, non-empty tags.
    #[must_use]
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    }

    /// Returns the first variant's parsed price, the source of a product's
    /// base price during reconciliation.
    #[must_use]
    pub fn base_price(&self) -> Option<Decimal> {
        self.variants
            .first()
            .and_then(|v| v.price.as_deref())
            .and_then(parse_price)
    }
}

impl ExternalVariant {
    /// Returns the first non-empty option slot, the free-text token used for
    /// attribute matching when no SKU or inventory-item id lines up.
    #[must_use]
    pub fn size_token(&self) -> Option<&str> {
        [&self.option1, &self.option2, &self.option3]
            .into_iter()
            .filter_map(|opt| opt.as_deref())
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    /// Parsed variant price; `None` when absent or not a valid decimal.
    #[must_use]
    pub fn parsed_price(&self) -> Option<Decimal> {
        self.price.as_deref().and_then(parse_price)
    }

    /// Inventory quantity with Shopify's missing-value default of zero.
    #[must_use]
    pub fn stock(&self) -> i64 {
        self.inventory_quantity.unwrap_or(0)
    }
}

/// Parses a Shopify decimal price string into a [`Decimal`].
///
/// Returns `None` for empty or malformed values; callers fall back to the
/// existing stored price (products) or clear the override (variants).
#[must_use]
pub fn parse_price(raw: &str) -> Option<Decimal> {
    raw.trim().parse::<Decimal>().ok()
}

//! Admin REST API response types.

use serde::Deserialize;
use storesync_core::ExternalProduct;

/// Top-level response from `GET /admin/api/<version>/inventory_levels.json`.
#[derive(Debug, Deserialize)]
pub(crate) struct InventoryLevelsResponse {
    #[serde(default)]
    pub inventory_levels: Vec<InventoryLevel>,
}

/// One location's stock record for an inventory item.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryLevel {
    #[serde(default)]
    pub inventory_item_id: Option<i64>,
    #[serde(default)]
    pub location_id: Option<i64>,
    /// Units available at this location; `null` when tracking is disabled.
    #[serde(default)]
    pub available: Option<i64>,
}

/// Inventory levels for one item, aggregated across locations.
#[derive(Debug, Clone)]
pub struct InventoryLevels {
    /// Sum of `available` across all locations, missing values counted as 0.
    pub total_available: i64,
    pub levels: Vec<InventoryLevel>,
}

impl InventoryLevels {
    pub(crate) fn from_levels(levels: Vec<InventoryLevel>) -> Self {
        let total_available = levels.iter().map(|l| l.available.unwrap_or(0)).sum();
        Self {
            total_available,
            levels,
        }
    }
}

/// One page of the Admin `products.json` listing. Shares the webhook payload
/// shape, so products deserialize straight into [`ExternalProduct`].
#[derive(Debug, Deserialize)]
pub struct ProductsPage {
    #[serde(default)]
    pub products: Vec<ExternalProduct>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_available_sums_and_defaults_missing_to_zero() {
        let levels: InventoryLevelsResponse = serde_json::from_str(
            r#"{"inventory_levels": [
                {"inventory_item_id": 1, "location_id": 10, "available": 3},
                {"inventory_item_id": 1, "location_id": 11},
                {"inventory_item_id": 1, "location_id": 12, "available": null},
                {"inventory_item_id": 1, "location_id": 13, "available": 4}
            ]}"#,
        )
        .expect("levels payload");
        let aggregated = InventoryLevels::from_levels(levels.inventory_levels);
        assert_eq!(aggregated.total_available, 7);
        assert_eq!(aggregated.levels.len(), 4);
    }

    #[test]
    fn empty_inventory_levels_default() {
        let levels: InventoryLevelsResponse = serde_json::from_str("{}").expect("empty payload");
        assert!(levels.inventory_levels.is_empty());
    }
}

//! Catalog item matching: locating the internal variant an external variant
//! refers to.
//!
//! Shopify identifies variants by numeric id, internal variants by their own
//! surrogate keys, so reconciliation has to line them up from shared
//! attributes. Strategies are applied in strict order, stopping at the first
//! success; a miss is expected (the variant may not have been imported) and
//! never an error.

use storesync_core::ExternalVariant;
use storesync_db::VariantRow;

/// Resolves the internal variant for an external one, used by the
/// product-update path.
///
/// Strategy order:
/// 1. stored inventory-item id equals the external variant's;
/// 2. external SKU is non-empty and equals an internal SKU exactly;
/// 3. the external size token equals an internal `size`, case-folded and
///    whitespace-trimmed.
#[must_use]
pub fn match_variant<'a>(
    external: &ExternalVariant,
    candidates: &'a [VariantRow],
) -> Option<&'a VariantRow> {
    if let Some(found) = match_by_inventory_item(external, candidates) {
        return Some(found);
    }
    if let Some(found) = match_by_sku(external, candidates) {
        return Some(found);
    }
    match_by_size(external, candidates)
}

/// Resolves every internal variant the inventory-level path should update.
///
/// Unlike [`match_variant`], all satisfying candidates are collected, and the
/// free-text token is tried against both the `size` and `color` slots —
/// this path cannot tell which attribute the option field held.
#[must_use]
pub fn collect_inventory_matches<'a>(
    external: &ExternalVariant,
    candidates: &'a [VariantRow],
) -> Vec<&'a VariantRow> {
    candidates
        .iter()
        .filter(|row| {
            inventory_item_matches(external, row)
                || sku_matches(external, row)
                || option_token_matches(external, row)
        })
        .collect()
}

fn match_by_inventory_item<'a>(
    external: &ExternalVariant,
    candidates: &'a [VariantRow],
) -> Option<&'a VariantRow> {
    candidates
        .iter()
        .find(|row| inventory_item_matches(external, row))
}

fn match_by_sku<'a>(
    external: &ExternalVariant,
    candidates: &'a [VariantRow],
) -> Option<&'a VariantRow> {
    candidates.iter().find(|row| sku_matches(external, row))
}

fn match_by_size<'a>(
    external: &ExternalVariant,
    candidates: &'a [VariantRow],
) -> Option<&'a VariantRow> {
    let token = external.size_token()?;
    candidates
        .iter()
        .find(|row| row.size.as_deref().is_some_and(|size| eq_token(size, token)))
}

fn inventory_item_matches(external: &ExternalVariant, row: &VariantRow) -> bool {
    match (external.inventory_item_id, row.shopify_inventory_item_id.as_deref()) {
        (Some(id), Some(stored)) => stored == id.to_string(),
        _ => false,
    }
}

fn sku_matches(external: &ExternalVariant, row: &VariantRow) -> bool {
    match (external.sku.as_deref(), row.sku.as_deref()) {
        (Some(external_sku), Some(stored)) if !external_sku.is_empty() => stored == external_sku,
        _ => false,
    }
}

fn option_token_matches(external: &ExternalVariant, row: &VariantRow) -> bool {
    let Some(token) = external.size_token() else {
        return false;
    };
    row.size.as_deref().is_some_and(|size| eq_token(size, token))
        || row.color.as_deref().is_some_and(|color| eq_token(color, token))
}

/// Case-insensitive, whitespace-trimmed equality for free-text attribute
/// tokens.
fn eq_token(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

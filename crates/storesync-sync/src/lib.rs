//! Catalog reconciliation: applying Shopify webhook payloads to the
//! per-storefront catalog.
//!
//! The engine only ever mutates stock, price, and image fields on existing
//! documents. It never creates or deletes products or variants — those are
//! owned by the importer and admin tooling. Every sweep is best-effort:
//! failures are recovered per storefront and per variant so one bad row
//! cannot block the rest of the update.

mod engine;
mod error;
mod inventory;
pub mod matcher;

pub use engine::{apply_product_update, UpdatedProduct};
pub use error::SyncError;
pub use inventory::apply_inventory_level_update;

use thiserror::Error;

/// Errors surfaced by the reconciliation engine.
///
/// Per-storefront and per-variant failures are logged and absorbed inside
/// the sweep; only failures that prevent the sweep from running at all (the
/// mirror scan, for instance) reach the caller.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Db(#[from] storesync_db::DbError),
}

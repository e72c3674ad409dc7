//! Backing stores for account ledgers.
//!
//! The engine only needs two things from durable storage: load an account's whole
//! ledger and save it back. A save either commits everything it was given or fails
//! with `Error::Persistence` and leaves the previous state in place.

use crate::{
    core::{account::AccountId, ledger::LedgerState},
    errors::{Error, Result},
};

/// In-memory store, used by tests and as a local fallback
pub mod memory;
/// `SeaORM`/`SQLite` store
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Durable keyed storage mapping an account to its ledger.
#[allow(async_fn_in_trait)]
pub trait LedgerStore {
    /// Returns `Ok(None)` when the account has never been opened.
    async fn load(&self, account: &AccountId) -> Result<Option<LedgerState>>;

    /// Replaces the stored ledger for `account` with `state`, atomically.
    ///
    /// Fails with `Error::Persistence` when the stored ledger is not the one `state` was
    /// loaded from (see [`LedgerState::revision`]).
    async fn save(&self, account: &AccountId, state: &LedgerState) -> Result<()>;
}

/// Rejects a save whose state was loaded before the stored ledger last changed.
///
/// `stored` is the revision currently held by the store, `None` when the account has
/// no ledger yet. A stored ledger has been saved at least once, so its revision is
/// never 0.
///
/// # Errors
/// `Error::Persistence` on a mismatch. Retrying the whole operation reloads the ledger.
pub(crate) fn check_revision(
    account: &AccountId,
    stored: Option<u64>,
    state: &LedgerState,
) -> Result<()> {
    if stored.unwrap_or(0) == state.revision {
        return Ok(());
    }
    Err(Error::Persistence {
        message: format!(
            "ledger for '{account}' changed since it was loaded (stored revision {}, saving revision {})",
            stored.map_or_else(|| "none".to_string(), |r| r.to_string()),
            state.revision
        ),
    })
}

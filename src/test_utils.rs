//! Shared test utilities for the allowance ledger.
//!
//! Helpers for building dates, engines with a controllable clock, in-memory databases
//! and a store whose saves can be made to fail on demand.

use crate::{
    core::{
        account::AccountId,
        category::CategoryCatalog,
        clock::ManualClock,
        cycle::Frequency,
        ledger::{LedgerEngine, LedgerState},
    },
    errors::{Error, Result},
    store::{LedgerStore, MemoryStore},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shorthand for a calendar date. Panics on an invalid date, which is a test bug.
#[allow(clippy::unwrap_used)]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Engine over a fresh `MemoryStore` with account "ada" already opened on `today`.
///
/// The returned clock is shared with the engine, so moving it moves the engine's "today".
pub async fn setup_engine(
    today: NaiveDate,
    frequency: Frequency,
) -> Result<(LedgerEngine<MemoryStore, ManualClock>, ManualClock, AccountId)> {
    let clock = ManualClock::new(today);
    let engine =
        LedgerEngine::with_clock(MemoryStore::new(), CategoryCatalog::default(), clock.clone());
    let account = AccountId::new("ada")?;
    engine.open_account(&account, frequency).await?;
    Ok((engine, clock, account))
}

/// Wraps a store and rejects every save while failure is switched on.
#[derive(Debug)]
pub struct FailingStore<S> {
    inner: S,
    fail: AtomicBool,
}

impl<S> FailingStore<S> {
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl<S: LedgerStore> LedgerStore for FailingStore<S> {
    async fn load(&self, account: &AccountId) -> Result<Option<LedgerState>> {
        self.inner.load(account).await
    }

    async fn save(&self, account: &AccountId, state: &LedgerState) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Persistence {
                message: "simulated store outage".to_string(),
            });
        }
        self.inner.save(account, state).await
    }
}

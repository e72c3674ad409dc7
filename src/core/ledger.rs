//! The ledger engine - records transactions against the open allowance cycle and
//! rolls cycles over.
//!
//! Every operation works on one account's [`LedgerState`]. Mutating operations load
//! the state from the backing store, change a copy, and report success only after the
//! store accepted the copy. A failed save therefore leaves the stored ledger, and
//! everything later reads observe, exactly as it was.
//!
//! Operations on the same account are serialized through a per-account `RwLock`:
//! anything that may write (including the rollover check run by
//! [`LedgerEngine::current_cycle_summary`]) takes the write half, plain listings take
//! the read half.

use crate::{
    core::{
        account::AccountId,
        category::{CategoryCatalog, CategoryDef, TransactionKind},
        clock::{Clock, SystemClock},
        cycle::{Cycle, Frequency},
        summary::CycleSummary,
        transaction::{NewTransaction, Transaction, ValidTransaction, newest_first},
    },
    errors::{Error, Result},
    store::LedgerStore,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    iter,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Everything persisted for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    /// Cycle frequency, fixed when the account was opened
    pub frequency: Frequency,
    /// The one open cycle
    pub current: Cycle,
    /// Frozen cycles, oldest first
    pub closed: Vec<Cycle>,
    /// Every transaction of the account in recording order
    pub transactions: Vec<Transaction>,
    /// Id the next recorded transaction will get
    pub next_transaction_id: u64,
    /// Number of saves the store had committed when this state was loaded.
    ///
    /// Stores only accept a state whose revision matches the stored one, so a save
    /// based on an outdated load fails instead of overwriting newer data.
    #[serde(default)]
    pub revision: u64,
}

impl LedgerState {
    /// A brand-new ledger whose first cycle starts on `start_date`.
    #[must_use]
    pub fn new(frequency: Frequency, start_date: NaiveDate) -> Self {
        Self {
            frequency,
            current: Cycle::open(frequency, start_date),
            closed: Vec::new(),
            transactions: Vec::new(),
            next_transaction_id: 1,
            revision: 0,
        }
    }

    /// Closed cycles oldest first, then the open one.
    pub fn cycles(&self) -> impl Iterator<Item = &Cycle> {
        self.closed.iter().chain(iter::once(&self.current))
    }

    #[must_use]
    pub fn cycle(&self, cycle_id: &str) -> Option<&Cycle> {
        self.cycles().find(|cycle| cycle.id == cycle_id)
    }

    /// `(total_income, total_expenses)` recomputed from the transactions tagged with `cycle_id`.
    #[must_use]
    pub fn totals_for(&self, cycle_id: &str) -> (Decimal, Decimal) {
        self.transactions
            .iter()
            .filter(|tx| tx.cycle_id == cycle_id)
            .fold((Decimal::ZERO, Decimal::ZERO), |(income, expenses), tx| {
                match tx.kind {
                    TransactionKind::Income => (income.saturating_add(tx.amount), expenses),
                    TransactionKind::Expense => (income, expenses.saturating_add(tx.amount)),
                }
            })
    }

    /// Closes the current cycle and opens a new one starting on `now` if `now` lies in
    /// a later period. Returns the cycle that was closed.
    pub(crate) fn roll_over(&mut self, now: NaiveDate) -> Option<Cycle> {
        if !self.current.has_ended_by(now) {
            return None;
        }

        let mut finished = std::mem::replace(&mut self.current, Cycle::open(self.frequency, now));
        finished.close();
        self.closed.push(finished.clone());
        Some(finished)
    }

    /// Tags `valid` with the current cycle, appends it and updates the aggregates.
    ///
    /// # Errors
    /// `Error::Validation` if the amount would overflow the cycle totals; the state is
    /// left unchanged.
    pub(crate) fn append(&mut self, valid: ValidTransaction) -> Result<Transaction> {
        let transaction =
            Transaction::from_valid(valid, self.next_transaction_id, self.current.id.clone());
        self.current.apply(transaction.kind, transaction.amount)?;
        self.next_transaction_id += 1;
        self.transactions.push(transaction.clone());
        Ok(transaction)
    }

    /// The state as a store holds it after committing this one.
    #[must_use]
    pub fn committed(&self) -> Self {
        Self {
            revision: self.revision + 1,
            ..self.clone()
        }
    }
}

/// Outcome of [`LedgerEngine::check_and_rollover_cycle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rollover {
    /// Whether a new cycle was opened
    pub rolled: bool,
    /// The cycle that was just frozen
    pub closed_cycle: Option<Cycle>,
    /// The cycle that is open now, when it changed
    pub new_cycle: Option<Cycle>,
}

impl Rollover {
    const fn unchanged() -> Self {
        Self {
            rolled: false,
            closed_cycle: None,
            new_cycle: None,
        }
    }
}

/// Records transactions and keeps per-cycle aggregates for any number of accounts.
pub struct LedgerEngine<S, C = SystemClock> {
    store: S,
    clock: C,
    catalog: CategoryCatalog,
    locks: Mutex<HashMap<AccountId, Arc<RwLock<()>>>>,
}

impl<S: LedgerStore> LedgerEngine<S, SystemClock> {
    /// Engine that reads "today" from the UTC wall clock.
    pub fn new(store: S, catalog: CategoryCatalog) -> Self {
        Self::with_clock(store, catalog, SystemClock)
    }
}

impl<S: LedgerStore, C: Clock> LedgerEngine<S, C> {
    pub fn with_clock(store: S, catalog: CategoryCatalog, clock: C) -> Self {
        Self {
            store,
            clock,
            catalog,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Today's date according to the engine's clock.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub const fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Categories for `kind` (or all), sorted by display name.
    #[must_use]
    pub fn categories(&self, kind: Option<TransactionKind>) -> Vec<CategoryDef> {
        self.catalog.sorted(kind)
    }

    /// Creates the ledger for `account` with its first cycle opening today.
    ///
    /// # Errors
    /// `Error::AccountExists` if the account already has a ledger,
    /// `Error::Persistence` if the store fails.
    #[instrument(skip_all, fields(account = %account, frequency = ?frequency))]
    pub async fn open_account(&self, account: &AccountId, frequency: Frequency) -> Result<Cycle> {
        let lock = self.account_lock(account);
        let _guard = lock.write().await;

        if self.store.load(account).await?.is_some() {
            return Err(Error::AccountExists {
                account: account.to_string(),
            });
        }

        let state = LedgerState::new(frequency, self.clock.today());
        self.commit(account, &state).await?;

        info!(cycle = %state.current.id, "Opened ledger");
        Ok(state.current)
    }

    /// Validates and records a transaction against the cycle that is open today.
    ///
    /// The rollover check runs first, so a transaction recorded after a period boundary
    /// lands in the new cycle. If the final save fails, neither the rollover nor the
    /// transaction is committed.
    ///
    /// # Errors
    /// `Error::Validation` for bad input, `Error::AccountNotFound` for an account that was
    /// never opened, `Error::Persistence` if the store fails.
    #[instrument(skip_all, fields(account = %account, kind = %new.kind))]
    pub async fn record_transaction(
        &self,
        account: &AccountId,
        new: NewTransaction,
    ) -> Result<Transaction> {
        let today = self.clock.today();
        let valid = new.validate(&self.catalog, today)?;

        let lock = self.account_lock(account);
        let _guard = lock.write().await;

        let mut state = self.load_existing(account).await?;
        if let Some(closed) = state.roll_over(today) {
            debug!(closed = %closed.id, opened = %state.current.id, "Rollover before recording");
        }
        let transaction = state.append(valid)?;
        self.commit(account, &state).await?;

        info!(
            id = transaction.id,
            amount = %transaction.amount,
            category = %transaction.category,
            cycle = %transaction.cycle_id,
            "Recorded transaction"
        );
        Ok(transaction)
    }

    /// Runs the rollover check for today and summarizes the open cycle.
    ///
    /// # Errors
    /// `Error::AccountNotFound` or `Error::Persistence` (only when a rollover had to be saved).
    #[instrument(skip_all, fields(account = %account))]
    pub async fn current_cycle_summary(&self, account: &AccountId) -> Result<CycleSummary> {
        let lock = self.account_lock(account);
        let _guard = lock.write().await;

        let mut state = self.load_existing(account).await?;
        if let Some(closed) = state.roll_over(self.clock.today()) {
            self.commit(account, &state).await?;
            info!(closed = %closed.id, opened = %state.current.id, "Rolled over cycle");
        }

        Ok(CycleSummary::for_cycle(&state.current, &state.transactions))
    }

    /// Transactions of the account, or of one cycle, newest first.
    ///
    /// Order: `date` descending, then recording order descending. An unknown `cycle_id`
    /// yields an empty list.
    ///
    /// # Errors
    /// `Error::AccountNotFound` or `Error::Persistence`.
    #[instrument(skip_all, fields(account = %account))]
    pub async fn list_transactions(
        &self,
        account: &AccountId,
        cycle_id: Option<&str>,
    ) -> Result<Vec<Transaction>> {
        let lock = self.account_lock(account);
        let _guard = lock.read().await;

        let state = self.load_existing(account).await?;
        let mut transactions: Vec<Transaction> = state
            .transactions
            .into_iter()
            .filter(|tx| cycle_id.is_none_or(|id| tx.cycle_id == id))
            .collect();
        transactions.sort_by(newest_first);
        Ok(transactions)
    }

    /// Closed cycles oldest first, followed by the open cycle.
    ///
    /// # Errors
    /// `Error::AccountNotFound` or `Error::Persistence`.
    pub async fn list_cycles(&self, account: &AccountId) -> Result<Vec<Cycle>> {
        let lock = self.account_lock(account);
        let _guard = lock.read().await;

        let state = self.load_existing(account).await?;
        Ok(state.cycles().cloned().collect())
    }

    /// One cycle of the account, open or closed.
    ///
    /// # Errors
    /// `Error::CycleNotFound` for an id the account never had, otherwise as
    /// [`Self::list_cycles`].
    pub async fn find_cycle(&self, account: &AccountId, cycle_id: &str) -> Result<Cycle> {
        let lock = self.account_lock(account);
        let _guard = lock.read().await;

        let state = self.load_existing(account).await?;
        state.cycle(cycle_id).cloned().ok_or_else(|| Error::CycleNotFound {
            cycle_id: cycle_id.to_string(),
        })
    }

    /// Closes the open cycle and opens a new one starting on `now` when `now` lies in a
    /// later period. Idempotent within a period.
    ///
    /// # Errors
    /// `Error::AccountNotFound` or `Error::Persistence`. On a failed save the previous
    /// cycle stays current.
    #[instrument(skip_all, fields(account = %account, now = %now))]
    pub async fn check_and_rollover_cycle(
        &self,
        account: &AccountId,
        now: NaiveDate,
    ) -> Result<Rollover> {
        let lock = self.account_lock(account);
        let _guard = lock.write().await;

        let mut state = self.load_existing(account).await?;
        let Some(closed) = state.roll_over(now) else {
            debug!(cycle = %state.current.id, "No rollover needed");
            return Ok(Rollover::unchanged());
        };
        self.commit(account, &state).await?;

        info!(
            closed = %closed.id,
            opened = %state.current.id,
            final_balance = %closed.balance,
            "Rolled over cycle"
        );
        Ok(Rollover {
            rolled: true,
            closed_cycle: Some(closed),
            new_cycle: Some(state.current),
        })
    }

    fn account_lock(&self, account: &AccountId) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(account.clone()).or_default())
    }

    async fn load_existing(&self, account: &AccountId) -> Result<LedgerState> {
        self.store
            .load(account)
            .await?
            .ok_or_else(|| Error::AccountNotFound {
                account: account.to_string(),
            })
    }

    async fn commit(&self, account: &AccountId, state: &LedgerState) -> Result<()> {
        self.store
            .save(account, state)
            .await
            .inspect_err(|e| warn!(%account, error = %e, "Failed to save ledger, nothing committed"))
    }
}

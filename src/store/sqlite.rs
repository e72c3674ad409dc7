//! `SQLite` backing store built on `SeaORM`.
//!
//! A ledger is spread over three tables: one `accounts` row, one `cycles` row per cycle
//! and one `ledger_transactions` row per transaction. `save` runs inside a single
//! database transaction, so a failed save rolls back to the previous ledger.
//!
//! Every save bumps the account's `revision`. A save presenting any other revision than
//! the stored one was computed from an outdated load and is rejected, so two processes
//! sharing one database cannot overwrite each other's transactions.
//!
//! Transactions are append-only, so a save only inserts the ones with an id above the
//! highest stored id. Closed cycles are frozen and only written once; the open cycle
//! row is updated on every save.

use crate::{
    config::database,
    core::{
        account::AccountId,
        category::TransactionKind,
        cycle::{Cycle, CycleStatus, Frequency},
        ledger::LedgerState,
        transaction::{IncomeFrequency, Transaction},
    },
    entities::{account, cycle, ledger_transaction},
    errors::{Error, Result},
    store::{LedgerStore, check_revision},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, QueryOrder, Set, TransactionTrait, prelude::*,
};
use std::{collections::HashMap, fmt::Display, str::FromStr};
use tracing::{debug, instrument};

/// Ledger store persisting to a `SeaORM` connection.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: DatabaseConnection,
}

impl SqliteStore {
    /// Wraps an existing connection. Tables must already exist.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connects to `database_url` and creates any missing tables.
    pub async fn connect(database_url: &str) -> Result<Self> {
        Ok(Self::new(database::create_connection(database_url).await?))
    }

    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl LedgerStore for SqliteStore {
    #[instrument(skip_all, fields(account = %account))]
    async fn load(&self, account: &AccountId) -> Result<Option<LedgerState>> {
        let Some(account_row) = account::Entity::find_by_id(account.as_str().to_string())
            .one(&self.db)
            .await?
        else {
            debug!("No ledger stored");
            return Ok(None);
        };

        let cycle_rows = cycle::Entity::find()
            .filter(cycle::Column::AccountId.eq(account.as_str()))
            .order_by_asc(cycle::Column::StartDate)
            .order_by_asc(cycle::Column::Id)
            .all(&self.db)
            .await?;

        let transaction_rows = ledger_transaction::Entity::find()
            .filter(ledger_transaction::Column::AccountId.eq(account.as_str()))
            .order_by_asc(ledger_transaction::Column::TransactionId)
            .all(&self.db)
            .await?;

        let state = assemble_state(account_row, cycle_rows, transaction_rows)?;
        debug!(
            cycles = state.closed.len() + 1,
            transactions = state.transactions.len(),
            "Loaded ledger"
        );
        Ok(Some(state))
    }

    #[instrument(skip_all, fields(account = %account))]
    async fn save(&self, account: &AccountId, state: &LedgerState) -> Result<()> {
        // All writes succeed or none do; dropping `txn` on error rolls back
        let txn = self.db.begin().await?;

        let stored = account::Entity::find_by_id(account.as_str().to_string())
            .one(&txn)
            .await?;
        check_revision(
            account,
            stored.as_ref().map(|row| from_db_revision(row.revision)).transpose()?,
            state,
        )?;

        save_account(&txn, account, stored, state).await?;
        let cycles_written = save_cycles(&txn, account, state).await?;
        let transactions_written = save_transactions(&txn, account, state).await?;

        txn.commit().await?;

        debug!(cycles_written, transactions_written, "Saved ledger");
        Ok(())
    }
}

async fn save_account<C: ConnectionTrait>(
    db: &C,
    account: &AccountId,
    stored: Option<account::Model>,
    state: &LedgerState,
) -> Result<()> {
    let now = Utc::now().naive_utc();
    let next_id = to_db_id(state.next_transaction_id)?;
    let revision = to_db_revision(state.committed().revision)?;

    match stored {
        Some(row) => {
            let mut active_model: account::ActiveModel = row.into();
            active_model.frequency = Set(state.frequency.as_str().to_string());
            active_model.next_transaction_id = Set(next_id);
            active_model.revision = Set(revision);
            active_model.updated_at = Set(now);
            active_model.update(db).await?;
        }
        None => {
            let new_account = account::ActiveModel {
                account_id: Set(account.as_str().to_string()),
                frequency: Set(state.frequency.as_str().to_string()),
                next_transaction_id: Set(next_id),
                revision: Set(revision),
                updated_at: Set(now),
            };
            new_account.insert(db).await?;
        }
    }

    Ok(())
}

/// Inserts new cycles and refreshes rows that were open when last stored.
async fn save_cycles<C: ConnectionTrait>(
    db: &C,
    account: &AccountId,
    state: &LedgerState,
) -> Result<usize> {
    let existing: HashMap<String, cycle::Model> = cycle::Entity::find()
        .filter(cycle::Column::AccountId.eq(account.as_str()))
        .all(db)
        .await?
        .into_iter()
        .map(|row| (row.cycle_id.clone(), row))
        .collect();

    let mut written = 0;
    for ledger_cycle in state.cycles() {
        match existing.get(&ledger_cycle.id) {
            Some(row) if !row.is_open => {}
            Some(row) => {
                let mut active_model: cycle::ActiveModel = row.clone().into();
                active_model.total_income = Set(ledger_cycle.total_income.to_string());
                active_model.total_expenses = Set(ledger_cycle.total_expenses.to_string());
                active_model.balance = Set(ledger_cycle.balance.to_string());
                active_model.is_open = Set(ledger_cycle.is_open());
                active_model.update(db).await?;
                written += 1;
            }
            None => {
                let new_cycle = cycle::ActiveModel {
                    account_id: Set(account.as_str().to_string()),
                    cycle_id: Set(ledger_cycle.id.clone()),
                    frequency: Set(ledger_cycle.frequency.as_str().to_string()),
                    start_date: Set(ledger_cycle.start_date),
                    total_income: Set(ledger_cycle.total_income.to_string()),
                    total_expenses: Set(ledger_cycle.total_expenses.to_string()),
                    balance: Set(ledger_cycle.balance.to_string()),
                    is_open: Set(ledger_cycle.is_open()),
                    ..Default::default()
                };
                new_cycle.insert(db).await?;
                written += 1;
            }
        }
    }

    Ok(written)
}

/// Appends the transactions recorded since the last save.
async fn save_transactions<C: ConnectionTrait>(
    db: &C,
    account: &AccountId,
    state: &LedgerState,
) -> Result<usize> {
    let stored_max = ledger_transaction::Entity::find()
        .filter(ledger_transaction::Column::AccountId.eq(account.as_str()))
        .order_by_desc(ledger_transaction::Column::TransactionId)
        .one(db)
        .await?
        .map(|row| row.transaction_id);

    let mut written = 0;
    for tx in &state.transactions {
        let transaction_id = to_db_id(tx.id)?;
        if stored_max.is_some_and(|max| transaction_id <= max) {
            continue;
        }

        let row = ledger_transaction::ActiveModel {
            account_id: Set(account.as_str().to_string()),
            transaction_id: Set(transaction_id),
            kind: Set(tx.kind.as_str().to_string()),
            amount: Set(tx.amount.to_string()),
            category: Set(tx.category.clone()),
            date: Set(tx.date),
            note: Set(tx.note.clone()),
            income_frequency: Set(tx.income_frequency.map(|f| f.as_str().to_string())),
            cycle_id: Set(tx.cycle_id.clone()),
            ..Default::default()
        };
        row.insert(db).await?;
        written += 1;
    }

    Ok(written)
}

fn assemble_state(
    account_row: account::Model,
    cycle_rows: Vec<cycle::Model>,
    transaction_rows: Vec<ledger_transaction::Model>,
) -> Result<LedgerState> {
    let frequency: Frequency = parse_column("accounts.frequency", &account_row.frequency)?;

    let mut current = None;
    let mut closed = Vec::new();
    for row in cycle_rows {
        let cycle = cycle_from_row(row)?;
        if cycle.is_open() {
            if current.is_some() {
                return Err(corrupt(format!(
                    "account '{}' has more than one open cycle",
                    account_row.account_id
                )));
            }
            current = Some(cycle);
        } else {
            closed.push(cycle);
        }
    }
    let current = current.ok_or_else(|| {
        corrupt(format!(
            "account '{}' has no open cycle",
            account_row.account_id
        ))
    })?;

    let transactions = transaction_rows
        .into_iter()
        .map(transaction_from_row)
        .collect::<Result<Vec<_>>>()?;

    Ok(LedgerState {
        frequency,
        current,
        closed,
        transactions,
        next_transaction_id: from_db_id(account_row.next_transaction_id)?,
        revision: from_db_revision(account_row.revision)?,
    })
}

fn cycle_from_row(row: cycle::Model) -> Result<Cycle> {
    Ok(Cycle {
        frequency: parse_column("cycles.frequency", &row.frequency)?,
        total_income: parse_column("cycles.total_income", &row.total_income)?,
        total_expenses: parse_column("cycles.total_expenses", &row.total_expenses)?,
        balance: parse_column::<Decimal>("cycles.balance", &row.balance)?,
        status: if row.is_open {
            CycleStatus::Open
        } else {
            CycleStatus::Closed
        },
        id: row.cycle_id,
        start_date: row.start_date,
    })
}

fn transaction_from_row(row: ledger_transaction::Model) -> Result<Transaction> {
    let income_frequency = row
        .income_frequency
        .as_deref()
        .map(|raw| parse_column::<IncomeFrequency>("ledger_transactions.income_frequency", raw))
        .transpose()?;

    Ok(Transaction {
        id: from_db_id(row.transaction_id)?,
        kind: parse_column::<TransactionKind>("ledger_transactions.kind", &row.kind)?,
        amount: parse_column("ledger_transactions.amount", &row.amount)?,
        category: row.category,
        date: row.date,
        note: row.note,
        income_frequency,
        cycle_id: row.cycle_id,
    })
}

fn parse_column<T>(column: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse()
        .map_err(|e| corrupt(format!("invalid value '{raw}' in {column}: {e}")))
}

fn to_db_id(id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|e| corrupt(format!("transaction id {id} out of range: {e}")))
}

fn from_db_id(id: i64) -> Result<u64> {
    u64::try_from(id).map_err(|e| corrupt(format!("stored transaction id {id} is negative: {e}")))
}

fn to_db_revision(revision: u64) -> Result<i64> {
    i64::try_from(revision).map_err(|e| corrupt(format!("revision {revision} out of range: {e}")))
}

fn from_db_revision(revision: i64) -> Result<u64> {
    u64::try_from(revision)
        .map_err(|e| corrupt(format!("stored revision {revision} is negative: {e}")))
}

fn corrupt(message: String) -> Error {
    Error::Persistence {
        message: format!("corrupt ledger data: {message}"),
    }
}

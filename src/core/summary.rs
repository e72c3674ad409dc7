//! Current-cycle summary handed to display layers.

use crate::core::{
    category::TransactionKind,
    cycle::{Cycle, CycleStatus, Frequency},
    transaction::{Transaction, newest_first},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Cycle metadata shown next to the totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleInfo {
    pub id: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    /// Last day of the period, see [`Cycle::end_date`]
    pub end_date: NaiveDate,
    /// e.g. `January 2024`
    pub period_name: String,
    pub status: CycleStatus,
}

impl From<&Cycle> for CycleInfo {
    fn from(cycle: &Cycle) -> Self {
        Self {
            id: cycle.id.clone(),
            frequency: cycle.frequency,
            start_date: cycle.start_date,
            end_date: cycle.end_date(),
            period_name: cycle.period_name(),
            status: cycle.status,
        }
    }
}

/// Totals of one cycle plus its transactions, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub cycle: CycleInfo,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub balance: Decimal,
    /// Expense totals keyed by category code
    pub spending_by_category: BTreeMap<String, Decimal>,
    pub recent_transactions: RecentTransactions,
}

impl CycleSummary {
    /// Builds the summary of `cycle` from the account's transactions.
    ///
    /// Totals come from the cycle's running aggregates; `transactions` may contain
    /// entries from other cycles, which are skipped.
    #[must_use]
    pub fn for_cycle(cycle: &Cycle, transactions: &[Transaction]) -> Self {
        let in_cycle: Vec<Transaction> = transactions
            .iter()
            .filter(|tx| tx.cycle_id == cycle.id)
            .cloned()
            .collect();

        let mut spending_by_category = BTreeMap::new();
        for tx in in_cycle
            .iter()
            .filter(|tx| tx.kind == TransactionKind::Expense)
        {
            let spent = spending_by_category
                .entry(tx.category.clone())
                .or_insert(Decimal::ZERO);
            *spent = spent.saturating_add(tx.amount);
        }

        Self {
            cycle: CycleInfo::from(cycle),
            total_income: cycle.total_income,
            total_expenses: cycle.total_expenses,
            balance: cycle.balance,
            spending_by_category,
            recent_transactions: RecentTransactions::new(in_cycle),
        }
    }
}

/// Reverse-chronological view over a cycle's transactions.
///
/// Callers take as many entries as they display; [`RecentTransactions::iter`] can be
/// called any number of times and always starts from the newest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RecentTransactions {
    newest_first: Vec<Transaction>,
}

impl RecentTransactions {
    fn new(mut transactions: Vec<Transaction>) -> Self {
        transactions.sort_by(newest_first);
        Self {
            newest_first: transactions,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.newest_first.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.newest_first.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.newest_first.is_empty()
    }
}

impl<'a> IntoIterator for &'a RecentTransactions {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//! Allowance cycles - bounded accounting periods and their rollover rules.
//!
//! A cycle opens on a start date and stays open until a rollover check finds that
//! "now" lies in a later period:
//!
//! * `Weekly` - the ISO week of `now` differs from the ISO week of the start date.
//!   Weeks are compared as `(iso_year, iso_week)` pairs so a cycle left open for a
//!   whole year still rolls.
//! * `Biweekly` - at least 14 whole days have elapsed since the start date.
//! * `Monthly` - `(year, month)` of `now` differs from that of the start date.
//!
//! A `now` earlier than the start date never triggers a rollover.

use crate::{
    core::category::TransactionKind,
    errors::{Error, Result},
};
use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Length of a biweekly cycle in days.
pub const BIWEEKLY_DAYS: i64 = 14;

/// How often the allowance cycle resets. Fixed per account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    /// Resets every ISO week (Monday start)
    Weekly,
    /// Resets every 14 days counted from the cycle start
    Biweekly,
    /// Resets every calendar month
    Monthly,
}

impl Frequency {
    /// Canonical upper-case name, as persisted.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "WEEKLY",
            Self::Biweekly => "BIWEEKLY",
            Self::Monthly => "MONTHLY",
        }
    }

    /// Lower-case prefix used in cycle ids.
    const fn id_prefix(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
        }
    }

    /// Whether `now` falls in a later period than one that started on `start`.
    #[must_use]
    pub fn boundary_crossed(self, start: NaiveDate, now: NaiveDate) -> bool {
        if now < start {
            return false;
        }

        match self {
            Self::Weekly => {
                let (a, b) = (start.iso_week(), now.iso_week());
                (a.year(), a.week()) != (b.year(), b.week())
            }
            Self::Biweekly => now.signed_duration_since(start).num_days() >= BIWEEKLY_DAYS,
            Self::Monthly => (start.year(), start.month()) != (now.year(), now.month()),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().replace(['-', '_', ' '], "").as_str() {
            "WEEKLY" => Ok(Self::Weekly),
            "BIWEEKLY" => Ok(Self::Biweekly),
            "MONTHLY" => Ok(Self::Monthly),
            _ => Err(Error::validation(format!(
                "unknown cycle frequency '{s}', expected WEEKLY, BIWEEKLY or MONTHLY"
            ))),
        }
    }
}

/// Whether a cycle still accepts transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CycleStatus {
    /// The current cycle
    Open,
    /// Frozen after a rollover
    Closed,
}

/// One accounting period and its running aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    /// Derived from `frequency` and `start_date`, see [`Cycle::id_for`]
    pub id: String,
    /// Reset frequency of the account that owns this cycle
    pub frequency: Frequency,
    /// Date the cycle opened
    pub start_date: NaiveDate,
    /// Sum of income amounts tagged with this cycle
    pub total_income: Decimal,
    /// Sum of expense amounts tagged with this cycle
    pub total_expenses: Decimal,
    /// Always `total_income - total_expenses`
    pub balance: Decimal,
    /// Open or closed
    pub status: CycleStatus,
}

impl Cycle {
    /// Opens a fresh cycle with zero aggregates.
    #[must_use]
    pub fn open(frequency: Frequency, start_date: NaiveDate) -> Self {
        Self {
            id: Self::id_for(frequency, start_date),
            frequency,
            start_date,
            total_income: Decimal::ZERO,
            total_expenses: Decimal::ZERO,
            balance: Decimal::ZERO,
            status: CycleStatus::Open,
        }
    }

    /// Deterministic cycle id, e.g. `monthly-2024-01-05`.
    #[must_use]
    pub fn id_for(frequency: Frequency, start_date: NaiveDate) -> String {
        format!("{}-{}", frequency.id_prefix(), start_date.format("%Y-%m-%d"))
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == CycleStatus::Open
    }

    /// Whether a rollover check at `now` should close this cycle.
    #[must_use]
    pub fn has_ended_by(&self, now: NaiveDate) -> bool {
        self.is_open() && self.frequency.boundary_crossed(self.start_date, now)
    }

    /// Last calendar day of the period this cycle covers.
    ///
    /// Weekly cycles end on the Sunday of the start date's ISO week, biweekly cycles
    /// 13 days after the start, monthly cycles on the last day of the start month.
    #[must_use]
    pub fn end_date(&self) -> NaiveDate {
        match self.frequency {
            Frequency::Weekly => {
                let remaining = 6 - u64::from(self.start_date.weekday().num_days_from_monday());
                self.start_date
                    .checked_add_days(Days::new(remaining))
                    .unwrap_or(NaiveDate::MAX)
            }
            Frequency::Biweekly => self
                .start_date
                .checked_add_days(Days::new(13))
                .unwrap_or(NaiveDate::MAX),
            Frequency::Monthly => last_day_of_month(self.start_date),
        }
    }

    /// Human-readable period label, e.g. `January 2024` or `Week 2, 2024`.
    #[must_use]
    pub fn period_name(&self) -> String {
        match self.frequency {
            Frequency::Weekly => {
                let week = self.start_date.iso_week();
                format!("Week {}, {}", week.week(), week.year())
            }
            Frequency::Biweekly => format!("Fortnight from {}", self.start_date.format("%Y-%m-%d")),
            Frequency::Monthly => self.start_date.format("%B %Y").to_string(),
        }
    }

    /// Adds one transaction to the aggregates. Leaves them untouched on overflow.
    ///
    /// # Errors
    /// `Error::Validation` when a total or the balance would leave the `Decimal` range.
    pub(crate) fn apply(&mut self, kind: TransactionKind, amount: Decimal) -> Result<()> {
        let (total_income, total_expenses, balance) = match kind {
            TransactionKind::Income => (
                self.total_income.checked_add(amount),
                Some(self.total_expenses),
                self.balance.checked_add(amount),
            ),
            TransactionKind::Expense => (
                Some(self.total_income),
                self.total_expenses.checked_add(amount),
                self.balance.checked_sub(amount),
            ),
        };

        match (total_income, total_expenses, balance) {
            (Some(total_income), Some(total_expenses), Some(balance)) => {
                self.total_income = total_income;
                self.total_expenses = total_expenses;
                self.balance = balance;
                Ok(())
            }
            _ => Err(Error::validation(format!(
                "amount {amount} would overflow the totals of cycle {}",
                self.id
            ))),
        }
    }

    pub(crate) fn close(&mut self) {
        self.status = CycleStatus::Closed;
    }
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };

    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .unwrap_or(date)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekly_rolls_from_sunday_to_monday() {
        // 2024-01-07 is a Sunday, 2024-01-08 the Monday after
        assert!(!Frequency::Weekly.boundary_crossed(date(2024, 1, 7), date(2024, 1, 7)));
        assert!(Frequency::Weekly.boundary_crossed(date(2024, 1, 7), date(2024, 1, 8)));
    }

    #[test]
    fn test_weekly_same_week_number_next_year_rolls() {
        // Both dates are in ISO week 2
        let start = date(2024, 1, 10);
        let now = date(2025, 1, 8);
        assert_eq!(start.iso_week().week(), now.iso_week().week());
        assert!(Frequency::Weekly.boundary_crossed(start, now));
    }

    #[test]
    fn test_weekly_iso_year_boundary() {
        // 2024-12-30 (Monday) is already ISO week 1 of 2025
        assert!(!Frequency::Weekly.boundary_crossed(date(2024, 12, 30), date(2025, 1, 5)));
        assert!(Frequency::Weekly.boundary_crossed(date(2024, 12, 29), date(2024, 12, 30)));
    }

    #[test]
    fn test_biweekly_needs_fourteen_days() {
        let start = date(2024, 1, 1);
        assert!(!Frequency::Biweekly.boundary_crossed(start, date(2024, 1, 14)));
        assert!(Frequency::Biweekly.boundary_crossed(start, date(2024, 1, 15)));
    }

    #[test]
    fn test_monthly_compares_year_and_month() {
        let start = date(2023, 12, 15);
        assert!(!Frequency::Monthly.boundary_crossed(start, date(2023, 12, 31)));
        assert!(Frequency::Monthly.boundary_crossed(start, date(2024, 1, 5)));
        // Same month number a year later is a different period
        assert!(Frequency::Monthly.boundary_crossed(start, date(2024, 12, 20)));
    }

    #[test]
    fn test_now_before_start_never_rolls() {
        let start = date(2024, 3, 10);
        for frequency in [Frequency::Weekly, Frequency::Biweekly, Frequency::Monthly] {
            assert!(!frequency.boundary_crossed(start, date(2024, 1, 1)));
        }
    }

    #[test]
    fn test_cycle_id_is_deterministic() {
        let a = Cycle::open(Frequency::Monthly, date(2024, 1, 5));
        let b = Cycle::open(Frequency::Monthly, date(2024, 1, 5));
        assert_eq!(a.id, "monthly-2024-01-05");
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, Cycle::open(Frequency::Weekly, date(2024, 1, 5)).id);
    }

    #[test]
    fn test_end_dates() {
        // Wednesday -> Sunday of the same ISO week
        assert_eq!(
            Cycle::open(Frequency::Weekly, date(2024, 1, 10)).end_date(),
            date(2024, 1, 14)
        );
        assert_eq!(
            Cycle::open(Frequency::Biweekly, date(2024, 1, 1)).end_date(),
            date(2024, 1, 14)
        );
        assert_eq!(
            Cycle::open(Frequency::Monthly, date(2024, 2, 10)).end_date(),
            date(2024, 2, 29)
        );
        assert_eq!(
            Cycle::open(Frequency::Monthly, date(2023, 12, 15)).end_date(),
            date(2023, 12, 31)
        );
    }

    #[test]
    fn test_period_names() {
        assert_eq!(
            Cycle::open(Frequency::Monthly, date(2024, 1, 5)).period_name(),
            "January 2024"
        );
        assert_eq!(
            Cycle::open(Frequency::Weekly, date(2024, 1, 10)).period_name(),
            "Week 2, 2024"
        );
        assert_eq!(
            Cycle::open(Frequency::Biweekly, date(2024, 1, 1)).period_name(),
            "Fortnight from 2024-01-01"
        );
    }

    #[test]
    fn test_apply_keeps_balance_consistent() {
        let mut cycle = Cycle::open(Frequency::Monthly, date(2024, 1, 1));
        cycle.apply(TransactionKind::Income, Decimal::new(50000, 2)).unwrap();
        cycle.apply(TransactionKind::Expense, Decimal::new(1250, 2)).unwrap();
        assert_eq!(cycle.total_income, Decimal::new(50000, 2));
        assert_eq!(cycle.total_expenses, Decimal::new(1250, 2));
        assert_eq!(cycle.balance, cycle.total_income - cycle.total_expenses);
    }

    #[test]
    fn test_apply_rejects_overflow_without_changing_totals() {
        let mut cycle = Cycle::open(Frequency::Monthly, date(2024, 1, 1));
        cycle.apply(TransactionKind::Income, Decimal::MAX).unwrap();

        let result = cycle.apply(TransactionKind::Income, Decimal::ONE);
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert_eq!(cycle.total_income, Decimal::MAX);
        assert_eq!(cycle.balance, Decimal::MAX);

        cycle.apply(TransactionKind::Expense, Decimal::MAX).unwrap();
        assert_eq!(cycle.balance, Decimal::ZERO);
        let result = cycle.apply(TransactionKind::Expense, Decimal::MAX);
        assert!(matches!(result, Err(Error::Validation { .. })));
        assert_eq!(cycle.total_expenses, Decimal::MAX);
        assert_eq!(cycle.balance, Decimal::ZERO);
    }

    #[test]
    fn test_closed_cycle_never_ends_again() {
        let mut cycle = Cycle::open(Frequency::Weekly, date(2024, 1, 7));
        cycle.close();
        assert!(!cycle.has_ended_by(date(2024, 3, 1)));
    }

    #[test]
    fn test_frequency_parsing() {
        assert_eq!("bi-weekly".parse::<Frequency>().unwrap(), Frequency::Biweekly);
        assert_eq!("Monthly".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert!("daily".parse::<Frequency>().is_err());
    }
}

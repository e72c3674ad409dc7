//! Transaction records and input validation.
//!
//! Callers describe a transaction with [`NewTransaction`]; the ledger validates it
//! against the category catalog before it is tagged with a cycle and stored as a
//! [`Transaction`]. Stored transactions are never mutated.

use crate::{
    core::category::{CategoryCatalog, TransactionKind},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, str::FromStr};

/// How often an income source repeats. Describes the source, not the allowance cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IncomeFrequency {
    /// One-off payment
    Once,
    /// Paid every week
    Weekly,
    /// Paid every month
    Monthly,
}

impl IncomeFrequency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Once => "ONCE",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
        }
    }
}

impl fmt::Display for IncomeFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncomeFrequency {
    type Err = Error;

    /// Accepts `once` as well as the `one-time` spelling used by entry forms.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().replace(['-', '_', ' '], "").as_str() {
            "ONCE" | "ONETIME" => Ok(Self::Once),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            _ => Err(Error::validation(format!(
                "unknown income frequency '{s}', expected ONCE, WEEKLY or MONTHLY"
            ))),
        }
    }
}

/// A recorded transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique within the account
    pub id: u64,
    /// Income or expense
    pub kind: TransactionKind,
    /// Always positive; the sign is carried by `kind`
    pub amount: Decimal,
    /// Canonical category code
    pub category: String,
    /// Calendar date the money moved
    pub date: NaiveDate,
    /// Free-text description
    pub note: Option<String>,
    /// Only set for income
    pub income_frequency: Option<IncomeFrequency>,
    /// Cycle that was open when the transaction was recorded
    pub cycle_id: String,
}

impl Transaction {
    /// Amount with the sign applied: positive for income, negative for expenses.
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }

    pub(crate) fn from_valid(valid: ValidTransaction, id: u64, cycle_id: String) -> Self {
        Self {
            id,
            kind: valid.kind,
            amount: valid.amount,
            category: valid.category,
            date: valid.date,
            note: valid.note,
            income_frequency: valid.income_frequency,
            cycle_id,
        }
    }
}

/// Input for recording a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: Decimal,
    /// Category code or display name, any casing
    pub category: String,
    /// Defaults to the ledger's current date when `None`
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
    pub income_frequency: Option<IncomeFrequency>,
}

impl NewTransaction {
    pub fn income(amount: Decimal, category: impl Into<String>) -> Self {
        Self::new(TransactionKind::Income, amount, category)
    }

    pub fn expense(amount: Decimal, category: impl Into<String>) -> Self {
        Self::new(TransactionKind::Expense, amount, category)
    }

    pub fn new(kind: TransactionKind, amount: Decimal, category: impl Into<String>) -> Self {
        Self {
            kind,
            amount,
            category: category.into(),
            date: None,
            note: None,
            income_frequency: None,
        }
    }

    #[must_use]
    pub const fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    #[must_use]
    pub const fn recurring(mut self, frequency: IncomeFrequency) -> Self {
        self.income_frequency = Some(frequency);
        self
    }

    /// Checks the input and canonicalizes the category and note.
    ///
    /// # Errors
    /// `Error::Validation` when the amount is not positive, the category does not belong
    /// to the enumeration for `kind`, or an income frequency is given for an expense.
    pub(crate) fn validate(
        self,
        catalog: &CategoryCatalog,
        today: NaiveDate,
    ) -> Result<ValidTransaction> {
        if self.amount <= Decimal::ZERO {
            return Err(Error::validation(format!(
                "amount must be greater than zero, got {}",
                self.amount
            )));
        }

        let category = catalog.resolve(self.kind, &self.category)?.code.clone();

        if self.kind == TransactionKind::Expense && self.income_frequency.is_some() {
            return Err(Error::validation(
                "income frequency can only be set on income transactions",
            ));
        }

        let note = self
            .note
            .map(|note| note.trim().to_string())
            .filter(|note| !note.is_empty());

        Ok(ValidTransaction {
            kind: self.kind,
            amount: self.amount.normalize(),
            category,
            date: self.date.unwrap_or(today),
            note,
            income_frequency: self.income_frequency,
        })
    }
}

/// Ledger display order: newest `date` first, later recordings first within a day.
pub(crate) fn newest_first(a: &Transaction, b: &Transaction) -> Ordering {
    b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id))
}

/// A [`NewTransaction`] that passed validation and is waiting for an id and a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ValidTransaction {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub income_frequency: Option<IncomeFrequency>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
    }

    #[test]
    fn test_validate_rejects_zero_and_negative_amounts() {
        let catalog = CategoryCatalog::default();

        let zero = NewTransaction::expense(Decimal::ZERO, "FOOD").validate(&catalog, today());
        assert!(matches!(zero, Err(Error::Validation { .. })));

        let negative =
            NewTransaction::expense(Decimal::new(-500, 2), "FOOD").validate(&catalog, today());
        assert!(matches!(negative, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_validate_rejects_expense_category_on_income() {
        let catalog = CategoryCatalog::default();
        let result = NewTransaction::income(Decimal::new(100, 0), "TRANSPORT")
            .validate(&catalog, today());
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_validate_rejects_income_frequency_on_expense() {
        let catalog = CategoryCatalog::default();
        let result = NewTransaction::expense(Decimal::new(100, 0), "RENT")
            .recurring(IncomeFrequency::Monthly)
            .validate(&catalog, today());
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_validate_canonicalizes_input() {
        let catalog = CategoryCatalog::default();
        let valid = NewTransaction::income(Decimal::new(25000, 2), "other income")
            .with_note("   ")
            .recurring(IncomeFrequency::Weekly)
            .validate(&catalog, today())
            .unwrap();

        assert_eq!(valid.category, "OTHER_INCOME");
        assert_eq!(valid.note, None);
        assert_eq!(valid.date, today());
        assert_eq!(valid.amount, Decimal::new(250, 0));
        assert_eq!(valid.income_frequency, Some(IncomeFrequency::Weekly));
    }

    #[test]
    fn test_validate_keeps_explicit_date() {
        let catalog = CategoryCatalog::default();
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let valid = NewTransaction::expense(Decimal::new(3, 0), "data")
            .on(date)
            .with_note(" bundle ")
            .validate(&catalog, today())
            .unwrap();
        assert_eq!(valid.date, date);
        assert_eq!(valid.note.as_deref(), Some("bundle"));
    }

    #[test]
    fn test_signed_amount() {
        let catalog = CategoryCatalog::default();
        let valid = NewTransaction::expense(Decimal::new(12, 0), "FOOD")
            .validate(&catalog, today())
            .unwrap();
        let tx = Transaction::from_valid(valid, 1, "monthly-2024-05-01".to_string());
        assert_eq!(tx.signed_amount(), Decimal::new(-12, 0));
    }

    #[test]
    fn test_income_frequency_parsing() {
        assert_eq!(
            "one-time".parse::<IncomeFrequency>().unwrap(),
            IncomeFrequency::Once
        );
        assert_eq!(
            "ONCE".parse::<IncomeFrequency>().unwrap(),
            IncomeFrequency::Once
        );
        assert!("yearly".parse::<IncomeFrequency>().is_err());
    }
}

//! Transaction kinds and the category catalog.
//!
//! Categories are configuration: the catalog holds one list of income categories and
//! one list of expense categories. A category is identified by its canonical code
//! (`FOOD`, `SCHOOL_FEES`, ...); display names are presentation data carried alongside.
//! Lookups are case-insensitive and treat spaces and dashes like underscores, so
//! `"school fees"`, `"School-Fees"` and `"SCHOOL_FEES"` all resolve to the same entry.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, str::FromStr};

/// Whether money came in or went out. The sign of a transaction lives here,
/// never in the stored amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    /// Money received
    Income,
    /// Money spent
    Expense,
}

impl TransactionKind {
    /// Canonical upper-case name, as persisted.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCOME" => Ok(Self::Income),
            "EXPENSE" => Ok(Self::Expense),
            other => Err(Error::validation(format!(
                "unknown transaction type '{other}', expected INCOME or EXPENSE"
            ))),
        }
    }
}

/// One entry of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDef {
    /// Canonical identifier, e.g. `FOOD`
    pub code: String,
    /// Human-readable label, e.g. `Food`
    pub display_name: String,
}

impl CategoryDef {
    /// Builds an entry, normalizing the code.
    pub fn new(code: &str, display_name: impl Into<String>) -> Self {
        Self {
            code: normalize_code(code),
            display_name: display_name.into(),
        }
    }
}

/// The fixed income and expense enumerations supplied to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCatalog {
    income: Vec<CategoryDef>,
    expense: Vec<CategoryDef>,
}

impl CategoryCatalog {
    /// Builds a catalog from the two lists.
    ///
    /// Codes are normalized. Fails when a code is empty or when the same code shows
    /// up twice, including once in each list: a category must belong to exactly one kind.
    pub fn new(income: Vec<CategoryDef>, expense: Vec<CategoryDef>) -> Result<Self> {
        let normalize = |defs: Vec<CategoryDef>| -> Vec<CategoryDef> {
            defs.into_iter()
                .map(|def| CategoryDef::new(&def.code, def.display_name))
                .collect()
        };
        let income = normalize(income);
        let expense = normalize(expense);

        let mut seen = HashSet::new();
        for def in income.iter().chain(expense.iter()) {
            if def.code.is_empty() {
                return Err(Error::Config {
                    message: "category codes must not be empty".to_string(),
                });
            }
            if !seen.insert(def.code.as_str()) {
                return Err(Error::Config {
                    message: format!("category code '{}' is defined more than once", def.code),
                });
            }
        }

        Ok(Self { income, expense })
    }

    /// Entries allowed for `kind`, in configuration order.
    #[must_use]
    pub fn entries(&self, kind: TransactionKind) -> &[CategoryDef] {
        match kind {
            TransactionKind::Income => &self.income,
            TransactionKind::Expense => &self.expense,
        }
    }

    /// Looks up `category` among the entries for `kind`.
    ///
    /// # Errors
    /// `Error::Validation` when the category is unknown or belongs to the other kind.
    pub fn resolve(&self, kind: TransactionKind, category: &str) -> Result<&CategoryDef> {
        let code = normalize_code(category);
        if code.is_empty() {
            return Err(Error::validation("category is required"));
        }

        if let Some(def) = self.entries(kind).iter().find(|def| def.code == code) {
            return Ok(def);
        }

        match self.kind_of(&code) {
            Some(other) => Err(Error::validation(format!(
                "category '{code}' is an {} category and cannot be used for {kind}",
                other.as_str().to_ascii_lowercase()
            ))),
            None => Err(Error::validation(format!("unknown category '{category}'"))),
        }
    }

    /// Which list a code belongs to, if any.
    #[must_use]
    pub fn kind_of(&self, code: &str) -> Option<TransactionKind> {
        let code = normalize_code(code);
        if self.income.iter().any(|def| def.code == code) {
            Some(TransactionKind::Income)
        } else if self.expense.iter().any(|def| def.code == code) {
            Some(TransactionKind::Expense)
        } else {
            None
        }
    }

    /// Display name for a stored code.
    #[must_use]
    pub fn display_name(&self, code: &str) -> Option<&str> {
        let code = normalize_code(code);
        self.income
            .iter()
            .chain(self.expense.iter())
            .find(|def| def.code == code)
            .map(|def| def.display_name.as_str())
    }

    /// Entries for one kind (or both when `kind` is `None`), sorted by display name.
    #[must_use]
    pub fn sorted(&self, kind: Option<TransactionKind>) -> Vec<CategoryDef> {
        let mut defs: Vec<CategoryDef> = match kind {
            Some(kind) => self.entries(kind).to_vec(),
            None => self.income.iter().chain(self.expense.iter()).cloned().collect(),
        };
        defs.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        defs
    }
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        let income = [
            ("ALLOWANCE", "Allowance"),
            ("SALARY", "Salary"),
            ("GIFTS", "Gifts"),
            ("OTHER_INCOME", "Other Income"),
        ];
        let expense = [
            ("FOOD", "Food"),
            ("TRANSPORT", "Transport"),
            ("DATA", "Data"),
            ("SCHOOL_FEES", "School Fees"),
            ("ENTERTAINMENT", "Entertainment"),
            ("RENT", "Rent"),
            ("UTILITIES", "Utilities"),
            ("SHOPPING", "Shopping"),
            ("MISC", "Misc"),
        ];
        let to_defs = |pairs: &[(&str, &str)]| -> Vec<CategoryDef> {
            pairs
                .iter()
                .map(|(code, name)| CategoryDef::new(code, *name))
                .collect()
        };

        Self {
            income: to_defs(&income),
            expense: to_defs(&expense),
        }
    }
}

/// Canonical form of a category code.
#[must_use]
pub fn normalize_code(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

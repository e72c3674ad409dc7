//! Ledger transaction entity - append-only income and expense records.
//!
//! `transaction_id` is the id the engine handed out, unique per account. The row id is
//! only a storage detail.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_transactions")]
pub struct Model {
    /// Row id
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning account
    pub account_id: String,
    /// Engine-assigned id, unique within the account
    pub transaction_id: i64,
    /// `"INCOME"` or `"EXPENSE"`
    pub kind: String,
    /// Positive decimal string
    pub amount: String,
    /// Canonical category code
    pub category: String,
    /// Calendar date of the transaction
    pub date: Date,
    /// Optional free text
    pub note: Option<String>,
    /// `"ONCE"`, `"WEEKLY"` or `"MONTHLY"`, income only
    pub income_frequency: Option<String>,
    /// Cycle open when the transaction was recorded
    pub cycle_id: String,
}

/// Defines relationships between `LedgerTransaction` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::AccountId"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

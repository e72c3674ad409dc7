//! Cycle entity - open and closed allowance cycles with their aggregates.
//!
//! Amounts are stored as decimal strings so no precision is lost on the way through
//! `SQLite`'s floating point column types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cycle database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cycles")]
pub struct Model {
    /// Row id
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning account
    pub account_id: String,
    /// Derived cycle id, e.g. `"monthly-2024-01-05"`; unique per account
    pub cycle_id: String,
    /// Frequency the cycle was opened with
    pub frequency: String,
    /// Date the cycle opened
    pub start_date: Date,
    /// Sum of income, decimal string
    pub total_income: String,
    /// Sum of expenses, decimal string
    pub total_expenses: String,
    /// Income minus expenses, decimal string
    pub balance: String,
    /// Exactly one open cycle per account
    pub is_open: bool,
}

/// Defines relationships between Cycle and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each cycle belongs to one account
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

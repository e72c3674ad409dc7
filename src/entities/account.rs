//! Account entity - one row per account ledger.
//!
//! Holds the settings that apply to every cycle of the account plus the counter used
//! to hand out transaction ids.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Account identity supplied by the session layer
    #[sea_orm(primary_key, auto_increment = false)]
    pub account_id: String,
    /// Allowance cycle frequency: `"WEEKLY"`, `"BIWEEKLY"` or `"MONTHLY"`
    pub frequency: String,
    /// Id the next recorded transaction will get
    pub next_transaction_id: i64,
    /// Number of committed saves; a save must present the revision it loaded
    pub revision: i64,
    /// When the ledger was last saved
    pub updated_at: DateTime,
}

/// Defines relationships between Account and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One account has many cycles
    #[sea_orm(has_many = "super::cycle::Entity")]
    Cycles,
    /// One account has many transactions
    #[sea_orm(has_many = "super::ledger_transaction::Entity")]
    Transactions,
}

impl Related<super::cycle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cycles.def()
    }
}

impl Related<super::ledger_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

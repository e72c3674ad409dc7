//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod account;
pub mod cycle;
pub mod ledger_transaction;

// Re-export specific types to avoid conflicts
pub use account::{Entity as Account, Model as AccountModel};
pub use cycle::{Entity as Cycle, Model as CycleModel};
pub use ledger_transaction::{Entity as LedgerTransaction, Model as LedgerTransactionModel};

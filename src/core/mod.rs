//! Core business logic - framework-agnostic ledger operations.

/// Account identity handed in by the session layer
pub mod account;
/// Transaction kinds and the configurable category catalog
pub mod category;
/// Source of the current date
pub mod clock;
/// Allowance cycles and their rollover rules
pub mod cycle;
/// Savings-goal icon lookup
pub mod goal;
/// The ledger engine
pub mod ledger;
/// Cycle summaries for display layers
pub mod summary;
/// Transaction records and validation
pub mod transaction;

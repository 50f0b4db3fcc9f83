//! Domain module
//!
//! Core domain types and the aggregation engine.

pub mod model;
pub mod summary;

pub use model::{Budget, Transaction, TransactionKind, User};
pub use summary::{
    budget_progress, summarize, BudgetProgress, BudgetStatus, CategoryTotal, Summary,
};

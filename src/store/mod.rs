//! Store module
//!
//! Database access for users, transactions, and budgets.
//!
//! Scoping contract: every transaction and budget query takes the acting
//! user's id as its leading parameter and binds it in SQL. Updates and
//! deletes that match zero rows report `NotFound`, whether the record is
//! absent or owned by someone else.

pub mod budgets;
pub mod transactions;
pub mod users;

pub use budgets::{BudgetPatch, BudgetStore, NewBudget};
pub use transactions::{NewTransaction, TransactionFilter, TransactionPatch, TransactionStore};
pub use users::UserStore;

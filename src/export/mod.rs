//! Export module
//!
//! Serializes a user's records to CSV: one header row derived from the wire
//! field names, one row per record. The full record set is materialized
//! before serialization; there is no streaming.

use crate::domain::{Budget, Transaction, TransactionKind};
use crate::error::AppError;

/// Serialize transactions to CSV bytes
pub fn transactions_csv(records: &[Transaction]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(["id", "userId", "type", "amount", "category", "date", "note"])?;

    for txn in records {
        let kind = match txn.kind {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        };

        writer.write_record([
            txn.id.to_string(),
            txn.user_id.to_string(),
            kind.to_string(),
            txn.amount.to_string(),
            txn.category.clone(),
            txn.date.to_rfc3339(),
            txn.note.clone(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV buffer flush failed: {}", e)))
}

/// Serialize budgets to CSV bytes
pub fn budgets_csv(records: &[Budget]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(["id", "userId", "category", "limit", "month", "spent"])?;

    for budget in records {
        writer.write_record([
            budget.id.to_string(),
            budget.user_id.to_string(),
            budget.category.clone(),
            budget.limit.to_string(),
            budget.month.clone(),
            budget.spent.map(|s| s.to_string()).unwrap_or_default(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV buffer flush failed: {}", e)))
}

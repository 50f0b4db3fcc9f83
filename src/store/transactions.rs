//! Transaction store
//!
//! Owner-scoped CRUD and search over dated monetary records. Every query
//! binds the acting user's id.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::domain::{Transaction, TransactionKind};
use crate::error::AppError;

const TXN_COLUMNS: &str = "id, user_id, kind, amount, category, date, note";

/// Fields for a new transaction, already validated at the API boundary
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub category: String,
    pub date: DateTime<Utc>,
    pub note: String,
}

/// Partial update; absent fields keep their stored values
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub kind: Option<TransactionKind>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

/// Search filters; all present filters apply conjunctively
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Exact category match
    pub category: Option<String>,
    /// Inclusive lower bound on date
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on date; callers widen date-only inputs to the
    /// end of that day
    pub end_date: Option<DateTime<Utc>>,
    /// Case-insensitive substring match on note
    pub keyword: Option<String>,
}

/// Store for transaction records
#[derive(Debug, Clone)]
pub struct TransactionStore {
    pool: PgPool,
}

impl TransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a transaction stamped with the owner's id
    pub async fn create(&self, user_id: Uuid, new: NewTransaction) -> Result<Transaction, AppError> {
        let txn = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            INSERT INTO transactions (id, user_id, kind, amount, category, date, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            TXN_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(new.kind)
        .bind(new.amount)
        .bind(&new.category)
        .bind(new.date)
        .bind(&new.note)
        .fetch_one(&self.pool)
        .await?;

        Ok(txn)
    }

    /// All of a user's transactions, newest first
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Transaction>, AppError> {
        let txns = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {} FROM transactions WHERE user_id = $1 ORDER BY date DESC",
            TXN_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(txns)
    }

    /// Apply a partial update to a record the user owns
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: TransactionPatch,
    ) -> Result<Transaction, AppError> {
        let txn = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            UPDATE transactions SET
                kind = COALESCE($3, kind),
                amount = COALESCE($4, amount),
                category = COALESCE($5, category),
                date = COALESCE($6, date),
                note = COALESCE($7, note),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            TXN_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(patch.kind)
        .bind(patch.amount)
        .bind(patch.category)
        .bind(patch.date)
        .bind(patch.note)
        .fetch_optional(&self.pool)
        .await?;

        txn.ok_or(AppError::NotFound("Transaction"))
    }

    /// Delete a record the user owns
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Transaction"));
        }

        Ok(())
    }

    /// Filtered search over the user's transactions, newest first
    pub async fn search(
        &self,
        user_id: Uuid,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, AppError> {
        let mut query = QueryBuilder::<sqlx::Postgres>::new(format!(
            "SELECT {} FROM transactions WHERE user_id = ",
            TXN_COLUMNS
        ));
        query.push_bind(user_id);

        if let Some(category) = &filter.category {
            query.push(" AND category = ");
            query.push_bind(category);
        }
        if let Some(start) = filter.start_date {
            query.push(" AND date >= ");
            query.push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND date <= ");
            query.push_bind(end);
        }
        if let Some(keyword) = &filter.keyword {
            query.push(" AND note ILIKE ");
            query.push_bind(format!("%{}%", escape_like(keyword)));
        }

        query.push(" ORDER BY date DESC");

        let txns = query
            .build_query_as::<Transaction>()
            .fetch_all(&self.pool)
            .await?;

        Ok(txns)
    }
}

/// Escape LIKE wildcards so keyword input matches literally
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

//! Budget store
//!
//! Owner-scoped CRUD over per-category monthly limits. Duplicate budgets for
//! the same (category, month) are allowed and reported independently.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::Budget;
use crate::error::AppError;

const BUDGET_COLUMNS: &str = "id, user_id, category, limit_amount, month, spent";

/// Fields for a new budget, already validated at the API boundary
#[derive(Debug, Clone)]
pub struct NewBudget {
    pub category: String,
    pub limit: Decimal,
    pub month: String,
    pub spent: Option<Decimal>,
}

/// Partial update; absent fields keep their stored values
#[derive(Debug, Clone, Default)]
pub struct BudgetPatch {
    pub category: Option<String>,
    pub limit: Option<Decimal>,
    pub month: Option<String>,
    pub spent: Option<Decimal>,
}

/// Store for budget records
#[derive(Debug, Clone)]
pub struct BudgetStore {
    pool: PgPool,
}

impl BudgetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a budget stamped with the owner's id
    pub async fn create(&self, user_id: Uuid, new: NewBudget) -> Result<Budget, AppError> {
        let budget = sqlx::query_as::<_, Budget>(&format!(
            r#"
            INSERT INTO budgets (id, user_id, category, limit_amount, month, spent)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            BUDGET_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&new.category)
        .bind(new.limit)
        .bind(&new.month)
        .bind(new.spent)
        .fetch_one(&self.pool)
        .await?;

        Ok(budget)
    }

    /// The user's budgets for one calendar month
    pub async fn list_for_month(&self, user_id: Uuid, month: &str) -> Result<Vec<Budget>, AppError> {
        let budgets = sqlx::query_as::<_, Budget>(&format!(
            "SELECT {} FROM budgets WHERE user_id = $1 AND month = $2 ORDER BY category",
            BUDGET_COLUMNS
        ))
        .bind(user_id)
        .bind(month)
        .fetch_all(&self.pool)
        .await?;

        Ok(budgets)
    }

    /// All of the user's budgets, for export
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Budget>, AppError> {
        let budgets = sqlx::query_as::<_, Budget>(&format!(
            "SELECT {} FROM budgets WHERE user_id = $1 ORDER BY month, category",
            BUDGET_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(budgets)
    }

    /// Apply a partial update to a record the user owns
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: BudgetPatch,
    ) -> Result<Budget, AppError> {
        let budget = sqlx::query_as::<_, Budget>(&format!(
            r#"
            UPDATE budgets SET
                category = COALESCE($3, category),
                limit_amount = COALESCE($4, limit_amount),
                month = COALESCE($5, month),
                spent = COALESCE($6, spent),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            BUDGET_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .bind(patch.category)
        .bind(patch.limit)
        .bind(patch.month)
        .bind(patch.spent)
        .fetch_optional(&self.pool)
        .await?;

        budget.ok_or(AppError::NotFound("Budget"))
    }

    /// Delete a record the user owns
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM budgets WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Budget"));
        }

        Ok(())
    }
}

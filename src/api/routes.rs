//! API Routes
//!
//! HTTP endpoint definitions. Every handler follows the same shape:
//! authenticate (middleware) -> validate -> scope to the principal ->
//! delegate to a store or the aggregation engine -> serialize.

use axum::{
    body::Body,
    extract::{Extension, Path, Query, State},
    http::{header, Response as HttpResponse, StatusCode},
    middleware,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::domain::{
    budget_progress, summarize, Budget, BudgetStatus, Summary, Transaction, TransactionKind,
};
use crate::error::AppError;
use crate::export;
use crate::store::{
    BudgetPatch, BudgetStore, NewBudget, NewTransaction, TransactionFilter, TransactionPatch,
    TransactionStore,
};

use super::middleware::{auth_middleware, logging_middleware, CurrentUser};
use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl SignupRequest {
    fn validate(&self) -> Result<(), AppError> {
        require_non_empty(&self.name, "name")?;
        require_non_empty(&self.email, "email")?;
        require_non_empty(&self.password, "password")?;

        if !self.email.contains('@') {
            return Err(AppError::Validation("email is invalid".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// User identity as exposed over the wire; never includes the password hash
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<CurrentUser> for ProfileResponse {
    fn from(user: CurrentUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    pub message: String,
    pub user: ProfileResponse,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub category: String,
    pub date: String,
    #[serde(default)]
    pub note: Option<String>,
}

impl CreateTransactionRequest {
    fn into_new(self) -> Result<NewTransaction, AppError> {
        if self.amount < Decimal::ZERO {
            return Err(AppError::Validation(
                "amount must be non-negative".to_string(),
            ));
        }
        require_non_empty(&self.category, "category")?;

        Ok(NewTransaction {
            kind: self.kind,
            amount: self.amount,
            category: self.category,
            date: parse_timestamp(&self.date)
                .ok_or_else(|| AppError::Validation("date must be YYYY-MM-DD or RFC 3339".to_string()))?,
            note: self.note.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    #[serde(rename = "type", default)]
    pub kind: Option<TransactionKind>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl UpdateTransactionRequest {
    fn into_patch(self) -> Result<TransactionPatch, AppError> {
        if matches!(self.amount, Some(amount) if amount < Decimal::ZERO) {
            return Err(AppError::Validation(
                "amount must be non-negative".to_string(),
            ));
        }

        let date = match self.date {
            Some(raw) => Some(parse_timestamp(&raw).ok_or_else(|| {
                AppError::Validation("date must be YYYY-MM-DD or RFC 3339".to_string())
            })?),
            None => None,
        };

        Ok(TransactionPatch {
            kind: self.kind,
            amount: self.amount,
            category: self.category,
            date,
            note: self.note,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
}

impl SearchQuery {
    fn into_filter(self) -> Result<TransactionFilter, AppError> {
        let start_date = match self.start_date {
            Some(raw) => Some(parse_timestamp(&raw).ok_or_else(|| {
                AppError::Validation("startDate must be YYYY-MM-DD or RFC 3339".to_string())
            })?),
            None => None,
        };

        // A date-only upper bound covers that entire day
        let end_date = match self.end_date {
            Some(raw) => Some(parse_end_of_day(&raw).ok_or_else(|| {
                AppError::Validation("endDate must be YYYY-MM-DD or RFC 3339".to_string())
            })?),
            None => None,
        };

        Ok(TransactionFilter {
            category: self.category.filter(|c| !c.is_empty()),
            start_date,
            end_date,
            keyword: self.keyword.filter(|k| !k.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBudgetRequest {
    pub category: String,
    pub limit: Decimal,
    pub month: String,
    #[serde(default)]
    pub spent: Option<Decimal>,
}

impl CreateBudgetRequest {
    fn into_new(self) -> Result<NewBudget, AppError> {
        require_non_empty(&self.category, "category")?;
        validate_limit(self.limit)?;
        validate_month(&self.month)?;

        Ok(NewBudget {
            category: self.category,
            limit: self.limit,
            month: self.month,
            spent: self.spent,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateBudgetRequest {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub limit: Option<Decimal>,
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub spent: Option<Decimal>,
}

impl UpdateBudgetRequest {
    fn into_patch(self) -> Result<BudgetPatch, AppError> {
        if let Some(limit) = self.limit {
            validate_limit(limit)?;
        }
        if let Some(month) = &self.month {
            validate_month(month)?;
        }

        Ok(BudgetPatch {
            category: self.category,
            limit: self.limit,
            month: self.month,
            spent: self.spent,
        })
    }
}

/// One budget row joined with its computed progress
#[derive(Debug, Serialize)]
pub struct BudgetProgressEntry {
    pub id: Uuid,
    pub category: String,
    pub limit: Decimal,
    pub month: String,
    pub spent: Decimal,
    pub percent: Decimal,
    pub status: BudgetStatus,
}

// =========================================================================
// Validation helpers
// =========================================================================

fn require_non_empty(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }

    Ok(())
}

fn validate_limit(limit: Decimal) -> Result<(), AppError> {
    if limit < Decimal::ZERO {
        return Err(AppError::Validation(
            "limit must be non-negative".to_string(),
        ));
    }

    Ok(())
}

fn validate_month(month: &str) -> Result<(), AppError> {
    crate::domain::summary::parse_month(month)
        .map(|_| ())
        .ok_or_else(|| AppError::Validation("month must be YYYY-MM".to_string()))
}

/// Parse an RFC 3339 timestamp or a plain date (midnight UTC)
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let date: NaiveDate = value.parse().ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

/// Parse an RFC 3339 timestamp, or a plain date widened to the end of that
/// day so it works as an inclusive upper bound
fn parse_end_of_day(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let date: NaiveDate = value.parse().ok()?;
    Some(date.and_hms_micro_opt(23, 59, 59, 999_999)?.and_utc())
}

// =========================================================================
// Router
// =========================================================================

/// Build the full application router
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login));

    // Note: the GET on /api/budgets/:id reads the path segment as a month
    // label ("YYYY-MM"); PUT and DELETE read it as a budget id.
    let protected = Router::new()
        .route("/api/auth/me", get(me).put(update_me))
        .route("/api/auth/verify", get(verify))
        .route(
            "/api/transactions",
            post(create_transaction).get(list_transactions),
        )
        .route("/api/transactions/summary", get(transaction_summary))
        .route("/api/transactions/search", get(search_transactions))
        .route("/api/transactions/export/csv", get(export_transactions))
        .route(
            "/api/transactions/:id",
            axum::routing::put(update_transaction).delete(delete_transaction),
        )
        .route("/api/budgets", post(create_budget))
        .route("/api/budgets/export/csv", get(export_budgets))
        .route("/api/budgets/progress/:month", get(budget_progress_report))
        .route(
            "/api/budgets/:id",
            get(list_budgets)
                .put(update_budget)
                .delete(delete_budget),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    public
        .merge(protected)
        .layer(middleware::from_fn(logging_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// =========================================================================
// POST /api/auth/signup
// =========================================================================

async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    request.validate()?;

    state
        .auth
        .signup(request.name.trim(), request.email.trim(), &request.password)
        .await?;

    Ok(Json(MessageResponse::new("User registered")))
}

// =========================================================================
// POST /api/auth/login
// =========================================================================

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = state.auth.login(request.email.trim(), &request.password).await?;

    Ok(Json(TokenResponse { token }))
}

// =========================================================================
// GET /api/auth/me
// =========================================================================

async fn me(Extension(user): Extension<CurrentUser>) -> Json<ProfileResponse> {
    Json(user.into())
}

// =========================================================================
// PUT /api/auth/me
// =========================================================================

async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UpdateProfileResponse>, AppError> {
    // An absent or blank name keeps the current one
    let profile = match request.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => {
            let updated = state.auth.update_name(user.id, name).await?;
            ProfileResponse {
                id: updated.id,
                name: updated.name,
                email: updated.email,
            }
        }
        _ => user.into(),
    };

    Ok(Json(UpdateProfileResponse {
        message: "Profile updated".to_string(),
        user: profile,
    }))
}

// =========================================================================
// GET /api/auth/verify
// =========================================================================

async fn verify(Extension(_user): Extension<CurrentUser>) -> Json<VerifyResponse> {
    Json(VerifyResponse { success: true })
}

// =========================================================================
// POST /api/transactions
// =========================================================================

async fn create_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<Json<Transaction>, AppError> {
    let new = request.into_new()?;

    let txn = TransactionStore::new(state.pool).create(user.id, new).await?;

    Ok(Json(txn))
}

// =========================================================================
// GET /api/transactions
// =========================================================================

async fn list_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let txns = TransactionStore::new(state.pool).list(user.id).await?;

    Ok(Json(txns))
}

// =========================================================================
// GET /api/transactions/summary
// =========================================================================

async fn transaction_summary(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Summary>, AppError> {
    let txns = TransactionStore::new(state.pool).list(user.id).await?;

    Ok(Json(summarize(&txns)))
}

// =========================================================================
// PUT /api/transactions/:id
// =========================================================================

async fn update_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTransactionRequest>,
) -> Result<Json<Transaction>, AppError> {
    let patch = request.into_patch()?;

    let txn = TransactionStore::new(state.pool)
        .update(user.id, id, patch)
        .await?;

    Ok(Json(txn))
}

// =========================================================================
// DELETE /api/transactions/:id
// =========================================================================

async fn delete_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    TransactionStore::new(state.pool).delete(user.id, id).await?;

    Ok(Json(MessageResponse::new("Transaction deleted")))
}

// =========================================================================
// GET /api/transactions/search
// =========================================================================

async fn search_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let filter = query.into_filter()?;

    let txns = TransactionStore::new(state.pool)
        .search(user.id, &filter)
        .await?;

    Ok(Json(txns))
}

// =========================================================================
// GET /api/transactions/export/csv
// =========================================================================

async fn export_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, AppError> {
    let txns = TransactionStore::new(state.pool).list(user.id).await?;

    let bytes = export::transactions_csv(&txns)?;

    csv_attachment("transactions.csv", bytes)
}

// =========================================================================
// POST /api/budgets
// =========================================================================

async fn create_budget(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<CreateBudgetRequest>,
) -> Result<Json<Budget>, AppError> {
    let new = request.into_new()?;

    let budget = BudgetStore::new(state.pool).create(user.id, new).await?;

    Ok(Json(budget))
}

// =========================================================================
// GET /api/budgets/:month
// =========================================================================

async fn list_budgets(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(month): Path<String>,
) -> Result<Json<Vec<Budget>>, AppError> {
    let budgets = BudgetStore::new(state.pool)
        .list_for_month(user.id, &month)
        .await?;

    Ok(Json(budgets))
}

// =========================================================================
// GET /api/budgets/progress/:month
// =========================================================================

async fn budget_progress_report(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(month): Path<String>,
) -> Result<Json<Vec<BudgetProgressEntry>>, AppError> {
    let budgets = BudgetStore::new(state.pool.clone())
        .list_for_month(user.id, &month)
        .await?;
    let txns = TransactionStore::new(state.pool).list(user.id).await?;

    let report = budgets
        .into_iter()
        .map(|budget| {
            let progress = budget_progress(&budget, &txns);
            BudgetProgressEntry {
                id: budget.id,
                category: budget.category,
                limit: budget.limit,
                month: budget.month,
                spent: progress.spent,
                percent: progress.percent,
                status: progress.status,
            }
        })
        .collect();

    Ok(Json(report))
}

// =========================================================================
// PUT /api/budgets/:id
// =========================================================================

async fn update_budget(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBudgetRequest>,
) -> Result<Json<Budget>, AppError> {
    let patch = request.into_patch()?;

    let budget = BudgetStore::new(state.pool).update(user.id, id, patch).await?;

    Ok(Json(budget))
}

// =========================================================================
// DELETE /api/budgets/:id
// =========================================================================

async fn delete_budget(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    BudgetStore::new(state.pool).delete(user.id, id).await?;

    Ok(Json(MessageResponse::new("Budget deleted")))
}

// =========================================================================
// GET /api/budgets/export/csv
// =========================================================================

async fn export_budgets(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Response, AppError> {
    let budgets = BudgetStore::new(state.pool).list(user.id).await?;

    let bytes = export::budgets_csv(&budgets)?;

    csv_attachment("budgets.csv", bytes)
}

/// Build a text/csv attachment response
fn csv_attachment(filename: &str, bytes: Vec<u8>) -> Result<Response, AppError> {
    HttpResponse::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(format!("Failed to build CSV response: {}", e)))
}

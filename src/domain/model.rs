//! Domain records
//!
//! Persistent record types shared by the stores and the API layer.
//! JSON field names follow the wire contract (camelCase, `type` for the
//! transaction kind); column names follow the SQL schema.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User identity record.
///
/// The password hash is never serialized into API responses.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Transaction type: money in or money out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// A dated, categorized monetary record owned by a single user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub category: String,
    pub date: DateTime<Utc>,
    pub note: String,
}

/// A per-category spending limit for one calendar month ("YYYY-MM").
///
/// `spent` is an optional precomputed figure: when present, budget progress
/// uses it verbatim instead of summing matching expense transactions.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    #[sqlx(rename = "limit_amount")]
    pub limit: Decimal,
    pub month: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spent: Option<Decimal>,
}

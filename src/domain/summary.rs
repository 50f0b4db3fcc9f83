//! Aggregation engine
//!
//! Deterministic, side-effect-free functions over a user's in-memory
//! transaction set: income/expense/savings totals, category breakdowns, and
//! budget-versus-spend progress.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Budget, Transaction, TransactionKind};

/// Percent threshold at which a budget counts as approaching its limit
const APPROACHING_PERCENT: u32 = 80;

/// Totals for one category label.
///
/// Serialized as `{_id, total}` per the summary wire contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    #[serde(rename = "_id")]
    pub category: String,
    pub total: Decimal,
}

/// Income/expense/savings totals plus per-category breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub income: Decimal,
    pub expense: Decimal,
    pub savings: Decimal,
    #[serde(rename = "categoryBreakdown")]
    pub category_breakdown: Vec<CategoryTotal>,
}

/// Compute totals and category breakdown over a transaction set.
///
/// Savings is income minus expense and may be negative. The breakdown sums
/// amounts of both kinds under each category label; categories are reported
/// in alphabetical order.
pub fn summarize(transactions: &[Transaction]) -> Summary {
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    let mut by_category: BTreeMap<&str, Decimal> = BTreeMap::new();

    for txn in transactions {
        match txn.kind {
            TransactionKind::Income => income += txn.amount,
            TransactionKind::Expense => expense += txn.amount,
        }

        *by_category.entry(txn.category.as_str()).or_default() += txn.amount;
    }

    Summary {
        income,
        expense,
        savings: income - expense,
        category_breakdown: by_category
            .into_iter()
            .map(|(category, total)| CategoryTotal {
                category: category.to_string(),
                total,
            })
            .collect(),
    }
}

/// Budget status tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    WithinLimit,
    Approaching,
    Exceeded,
}

/// Actual spend measured against a budget's limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetProgress {
    pub spent: Decimal,
    pub percent: Decimal,
    pub status: BudgetStatus,
}

/// Compare actual spend against a budget's limit.
///
/// A precomputed `spent` on the budget record is used verbatim; otherwise
/// spend is the sum of expense transactions matching the budget's category
/// and, when the month is parseable, its calendar month. Percent is capped
/// at 100 and zero when the limit is zero or negative. Exceeded requires
/// spend strictly above the limit and takes precedence over approaching.
pub fn budget_progress(budget: &Budget, transactions: &[Transaction]) -> BudgetProgress {
    let spent = budget.spent.unwrap_or_else(|| {
        transactions
            .iter()
            .filter(|t| {
                t.kind == TransactionKind::Expense
                    && t.category == budget.category
                    && month_matches(&budget.month, &t.date)
            })
            .map(|t| t.amount)
            .sum()
    });

    let percent = if budget.limit > Decimal::ZERO {
        (spent / budget.limit * Decimal::from(100)).min(Decimal::from(100))
    } else {
        Decimal::ZERO
    };

    let status = if spent > budget.limit {
        BudgetStatus::Exceeded
    } else if percent >= Decimal::from(APPROACHING_PERCENT) {
        BudgetStatus::Approaching
    } else {
        BudgetStatus::WithinLimit
    };

    BudgetProgress {
        spent,
        percent,
        status,
    }
}

/// Parse a "YYYY-MM" month label
pub fn parse_month(month: &str) -> Option<(i32, u32)> {
    let (year, month) = month.split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;

    (1..=12).contains(&month).then_some((year, month))
}

/// A timestamp matches an unparseable month label unconditionally, matching
/// the historical treatment of budgets without a usable month.
fn month_matches(month: &str, date: &DateTime<Utc>) -> bool {
    match parse_month(month) {
        Some((year, month)) => date.year() == year && date.month() == month,
        None => true,
    }
}

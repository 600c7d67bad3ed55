use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::Date;

/// Expense record, always owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Expense {
    pub id: i64,
    pub amount: f64,
    pub description: String,
    pub expense_date: Date,
    pub category: Option<String>,
    pub user_id: i64,
}

/// One row of the monthly category aggregation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategoryTotal {
    pub category: String,
    pub total_amount: f64,
}

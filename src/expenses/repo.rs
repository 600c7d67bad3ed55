use sqlx::PgPool;
use time::{Date, Month, OffsetDateTime};

use crate::error::AppError;
use crate::expenses::dto::{CreateExpenseRequest, UpdateExpenseRequest};
use crate::expenses::repo_types::{CategoryTotal, Expense};

const EXPENSE_COLUMNS: &str = "id, amount, description, expense_date, category, user_id";

/// Half-open [start, end) range covering the given calendar month.
fn month_bounds(year: i32, month: u8) -> Result<(Date, Date), AppError> {
    let month = Month::try_from(month)
        .map_err(|_| AppError::Validation("Month must be between 1 and 12.".into()))?;
    let start = Date::from_calendar_date(year, month, 1)
        .map_err(|_| AppError::Validation("Year is out of range.".into()))?;
    let next_year = if month == Month::December { year + 1 } else { year };
    let end = Date::from_calendar_date(next_year, month.next(), 1)
        .map_err(|_| AppError::Validation("Year is out of range.".into()))?;
    Ok((start, end))
}

impl Expense {
    pub async fn find_by_id(db: &PgPool, id: i64) -> Result<Option<Expense>, AppError> {
        let expense = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(expense)
    }

    pub async fn list_by_user(db: &PgPool, user_id: i64) -> Result<Vec<Expense>, AppError> {
        let rows = sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS}
             FROM expenses
             WHERE user_id = $1
             ORDER BY expense_date DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn create(
        db: &PgPool,
        create: CreateExpenseRequest,
        user_id: i64,
    ) -> Result<Expense, AppError> {
        let expense_date = create
            .expense_date
            .unwrap_or_else(|| OffsetDateTime::now_utc().date());
        let expense = sqlx::query_as::<_, Expense>(&format!(
            "INSERT INTO expenses (amount, description, expense_date, category, user_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {EXPENSE_COLUMNS}"
        ))
        .bind(create.amount)
        .bind(&create.description)
        .bind(expense_date)
        .bind(&create.category)
        .bind(user_id)
        .fetch_one(db)
        .await?;
        Ok(expense)
    }

    /// Apply a partial update; absent fields keep their stored value.
    pub async fn update(
        db: &PgPool,
        id: i64,
        update: UpdateExpenseRequest,
    ) -> Result<Option<Expense>, AppError> {
        let expense = sqlx::query_as::<_, Expense>(&format!(
            "UPDATE expenses
             SET amount = COALESCE($2, amount),
                 description = COALESCE($3, description),
                 expense_date = COALESCE($4, expense_date),
                 category = COALESCE($5, category)
             WHERE id = $1
             RETURNING {EXPENSE_COLUMNS}"
        ))
        .bind(id)
        .bind(update.amount)
        .bind(&update.description)
        .bind(update.expense_date)
        .bind(&update.category)
        .fetch_optional(db)
        .await?;
        Ok(expense)
    }

    pub async fn delete(db: &PgPool, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Sum of amounts per category for the owner's expenses in the given
    /// month. Uncategorized rows group under the sentinel label; categories
    /// with no matching rows are simply absent.
    pub async fn monthly_summary(
        db: &PgPool,
        user_id: i64,
        year: i32,
        month: u8,
    ) -> Result<Vec<CategoryTotal>, AppError> {
        let (start, end) = month_bounds(year, month)?;
        let rows = sqlx::query_as::<_, CategoryTotal>(
            "SELECT COALESCE(category, 'Uncategorized') AS category,
                    SUM(amount) AS total_amount
             FROM expenses
             WHERE user_id = $1 AND expense_date >= $2 AND expense_date < $3
             GROUP BY COALESCE(category, 'Uncategorized')
             ORDER BY category",
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}

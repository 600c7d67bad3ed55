use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument};

use crate::auth::extractors::CurrentUser;
use crate::error::AppError;
use crate::expenses::dto::{CreateExpenseRequest, MonthlySummaryResponse, UpdateExpenseRequest};
use crate::expenses::repo_types::Expense;
use crate::state::AppState;

pub fn expense_routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", post(create_expense))
        // No trailing-slash redirect in axum; accept both spellings.
        .route("/expenses/", post(create_expense))
        .route("/expenses/:id", get(read_expense))
        .route("/expenses/:id", put(update_expense))
        .route("/expenses/:id", delete(delete_expense))
        .route("/expenses/user/me", get(list_my_expenses))
        .route("/expenses/summary/:year/:month", get(monthly_summary))
}

/// Confirms the record exists and belongs to the caller. A mismatch is
/// reported as not-found so other users' expense ids stay unguessable.
async fn owned_expense(
    state: &AppState,
    expense_id: i64,
    owner_id: i64,
) -> Result<Expense, AppError> {
    match Expense::find_by_id(&state.db, expense_id).await? {
        Some(expense) if expense.user_id == owner_id => Ok(expense),
        _ => Err(AppError::NotFound("Expense")),
    }
}

#[instrument(skip(state, user, payload))]
pub async fn create_expense(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    payload.validate()?;
    let expense = Expense::create(&state.db, payload, user.id).await?;
    info!(expense_id = expense.id, user_id = user.id, "expense created");
    Ok((StatusCode::CREATED, Json(expense)))
}

#[instrument(skip(state, user))]
pub async fn read_expense(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Expense>, AppError> {
    let expense = owned_expense(&state, id, user.id).await?;
    Ok(Json(expense))
}

#[instrument(skip(state, user))]
pub async fn list_my_expenses(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Expense>>, AppError> {
    let expenses = Expense::list_by_user(&state.db, user.id).await?;
    Ok(Json(expenses))
}

#[instrument(skip(state, user, payload))]
pub async fn update_expense(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateExpenseRequest>,
) -> Result<Json<Expense>, AppError> {
    payload.validate()?;
    owned_expense(&state, id, user.id).await?;
    let updated = Expense::update(&state.db, id, payload)
        .await?
        .ok_or(AppError::NotFound("Expense"))?;
    info!(expense_id = id, user_id = user.id, "expense updated");
    Ok(Json(updated))
}

#[instrument(skip(state, user))]
pub async fn delete_expense(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    owned_expense(&state, id, user.id).await?;
    if !Expense::delete(&state.db, id).await? {
        return Err(AppError::NotFound("Expense"));
    }
    info!(expense_id = id, user_id = user.id, "expense deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, user))]
pub async fn monthly_summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((year, month)): Path<(i32, u8)>,
) -> Result<Json<MonthlySummaryResponse>, AppError> {
    let summary = Expense::monthly_summary(&state.db, user.id, year, month).await?;
    Ok(Json(MonthlySummaryResponse {
        year,
        month,
        summary,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::users::repo_types::User;
    use sqlx::PgPool;
    use std::sync::Arc;
    use time::macros::date;

    fn state_with(pool: PgPool) -> AppState {
        AppState {
            db: pool,
            config: Arc::new(test_config()),
        }
    }

    async fn register(db: &PgPool, email: &str) -> User {
        User::create(db, "Expense Owner", email, "stronG@123")
            .await
            .expect("create user")
    }

    #[sqlx::test]
    async fn other_users_expense_masks_as_not_found(pool: PgPool) {
        let owner = register(&pool, "owner@gmail.com").await;
        let intruder = register(&pool, "intruder@gmail.com").await;
        let expense = Expense::create(
            &pool,
            CreateExpenseRequest {
                amount: 50.75,
                description: "Groceries".into(),
                expense_date: Some(date!(2023 - 10 - 02)),
                category: Some("Food".into()),
            },
            owner.id,
        )
        .await
        .expect("create expense");
        let state = state_with(pool);

        // The owner resolves their own record.
        let found = owned_expense(&state, expense.id, owner.id)
            .await
            .expect("owner access");
        assert_eq!(found.amount, 50.75);
        assert_eq!(found.category.as_deref(), Some("Food"));

        // Another user's id and a nonexistent id are indistinguishable.
        let foreign = owned_expense(&state, expense.id, intruder.id)
            .await
            .unwrap_err();
        assert!(matches!(foreign, AppError::NotFound("Expense")));
        let missing = owned_expense(&state, expense.id + 1000, intruder.id)
            .await
            .unwrap_err();
        assert!(matches!(missing, AppError::NotFound("Expense")));
    }
}

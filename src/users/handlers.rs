use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::auth::extractors::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;
use crate::users::dto::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::users::repo_types::User;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        // No trailing-slash redirect in axum; accept both spellings.
        .route("/users/", post(create_user))
        .route("/users/:id", get(read_user))
        .route("/users/:id", put(update_user))
        .route("/users/:id", delete(delete_user))
}

/// Registration is the only unauthenticated user operation.
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    // Fast-path check; the unique index catches the race.
    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::DuplicateEmail);
    }

    let user = User::create(&state.db, &payload.name, &email, &payload.password).await?;
    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, current))]
pub async fn read_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    if user.id != current.id {
        return Err(AppError::Forbidden("Not authorised to access this user"));
    }
    Ok(Json(user.into()))
}

#[instrument(skip(state, current, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    if id != current.id {
        return Err(AppError::Forbidden("Not authorised to update this user"));
    }
    payload.validate()?;

    let updated = User::update(&state.db, id, payload)
        .await?
        .ok_or(AppError::NotFound("User"))?;
    info!(user_id = updated.id, "user updated");
    Ok(Json(updated.into()))
}

#[instrument(skip(state, current))]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if id != current.id {
        return Err(AppError::Forbidden("Not authorised to delete this user"));
    }
    if !User::delete(&state.db, id).await? {
        return Err(AppError::NotFound("User"));
    }
    info!(user_id = id, "user deleted with expenses");
    Ok(StatusCode::NO_CONTENT)
}

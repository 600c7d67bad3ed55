use axum::{
    extract::{FromRef, Query, State},
    routing::post,
    Form, Json, Router,
};
use tracing::{info, instrument, warn};

use crate::auth::dto::{LoginForm, RefreshParams, TokenPair};
use crate::auth::jwt::{JwtKeys, TokenScope};
use crate::auth::password::verify_password;
use crate::error::AppError;
use crate::state::AppState;
use crate::users::repo_types::User;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenPair>, AppError> {
    let email = form.username.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &email).await?;
    let user = match user {
        Some(u) if verify_password(&form.password, &u.password_hash) => u,
        _ => {
            warn!(email = %email, "login rejected");
            return Err(AppError::Unauthenticated(
                "Incorrect email or password".into(),
            ));
        }
    };

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.issue_access(&user.email)?;
    let refresh_token = keys.issue_refresh(&user.email)?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(Json(TokenPair::bearer(access_token, refresh_token)))
}

/// Issues a new access token; the still-valid refresh token is echoed back.
#[instrument(skip(state, params))]
pub async fn refresh(
    State(state): State<AppState>,
    Query(params): Query<RefreshParams>,
) -> Result<Json<TokenPair>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let email = keys
        .verify(&params.refresh_token, TokenScope::Refresh)
        .map_err(|e| {
            warn!(error = %e, "refresh token rejected");
            AppError::Unauthenticated("Invalid or expired refresh token".into())
        })?;

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("User not found".into()))?;

    let access_token = keys.issue_access(&user.email)?;
    info!(user_id = user.id, email = %user.email, "access token refreshed");
    Ok(Json(TokenPair::bearer(access_token, params.refresh_token)))
}

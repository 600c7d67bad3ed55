use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::jwt::{JwtKeys, TokenScope};
use crate::error::AppError;
use crate::state::AppState;
use crate::users::repo_types::User;

/// Resolves the bearer token to the authenticated user record. A valid
/// signature is not enough: the subject email must still map to a user,
/// which is what invalidates tokens of since-deleted accounts.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthenticated("Not authenticated".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthenticated("Not authenticated".into()))?;

        let keys = JwtKeys::from_ref(state);
        let email = keys.verify(token, TokenScope::Access).map_err(|e| {
            warn!(error = %e, "access token rejected");
            AppError::Unauthenticated("Could not validate credentials".into())
        })?;

        let user = User::find_by_email(&state.db, &email)
            .await?
            .ok_or_else(|| {
                warn!(subject = %email, "token subject no longer exists");
                AppError::Unauthenticated("Could not validate credentials".into())
            })?;

        Ok(CurrentUser(user))
    }
}

use serde::{Deserialize, Serialize};

/// Login form, OAuth2 password-grant field names.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String, // email
    pub password: String,
}

/// Query parameters for the refresh endpoint.
#[derive(Debug, Deserialize)]
pub struct RefreshParams {
    pub refresh_token: String,
}

/// Response returned after login or refresh.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

impl TokenPair {
    pub fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer",
        }
    }
}

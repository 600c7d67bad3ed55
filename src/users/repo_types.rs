use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String, // stored lowercase, used as login identifier
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: OffsetDateTime,
    // Present in the schema but never read by the verification path;
    // refresh tokens are currently stateless.
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token_expires_at: Option<OffsetDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn serialized_user_never_exposes_credentials() {
        let user = User {
            id: 1,
            name: "Test User".into(),
            email: "testuser@gmail.com".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: datetime!(2023-10-01 12:00 UTC),
            refresh_token: Some("stored-token".into()),
            refresh_token_expires_at: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("testuser@gmail.com"));
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("stored-token"));
    }
}

use sqlx::PgPool;

use crate::auth::password::hash_password;
use crate::error::AppError;
use crate::users::dto::UpdateUserRequest;
use crate::users::repo_types::User;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, created_at, refresh_token, refresh_token_expires_at";

impl User {
    pub async fn find_by_id(db: &PgPool, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Exact lookup; the caller normalizes the email to lowercase first.
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user: name trimmed, email lowercased, password hashed.
    /// The unique index on email is the authoritative duplicate guard; a
    /// unique violation surfaces as `DuplicateEmail`.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AppError> {
        let password_hash = hash_password(password)?;
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash)
             VALUES ($1, $2, $3)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name.trim())
        .bind(email.trim().to_lowercase())
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Apply a partial update. Absent fields keep their stored value; a new
    /// password is re-hashed and a new email lowercased before storage.
    pub async fn update(
        db: &PgPool,
        id: i64,
        update: UpdateUserRequest,
    ) -> Result<Option<User>, AppError> {
        let password_hash = match &update.password {
            Some(plain) => Some(hash_password(plain)?),
            None => None,
        };
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET name = COALESCE($2, name),
                 email = COALESCE($3, email),
                 password_hash = COALESCE($4, password_hash)
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.email.as_deref().map(|e| e.trim().to_lowercase()))
        .bind(password_hash)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Delete a user and all of their expenses in one transaction. The
    /// cascade is explicit rather than left to FK metadata so both deletes
    /// commit or roll back together.
    pub async fn delete(db: &PgPool, id: i64) -> Result<bool, AppError> {
        let mut tx = db.begin().await?;
        sqlx::query("DELETE FROM expenses WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::expenses::dto::CreateExpenseRequest;
    use crate::expenses::repo_types::Expense;
    use time::macros::date;

    async fn register(db: &PgPool, name: &str, email: &str) -> User {
        User::create(db, name, email, "stronG@123")
            .await
            .expect("create user")
    }

    #[sqlx::test]
    async fn create_normalizes_name_and_email(pool: PgPool) {
        let user = register(&pool, "  Test User  ", "MixedCase@Gmail.COM").await;
        assert_eq!(user.name, "Test User");
        assert_eq!(user.email, "mixedcase@gmail.com");

        let found = User::find_by_email(&pool, "mixedcase@gmail.com")
            .await
            .expect("lookup");
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[sqlx::test]
    async fn duplicate_email_rejected_by_unique_index(pool: PgPool) {
        register(&pool, "First User", "testuser@gmail.com").await;
        // Differently cased input normalizes to the same stored email, so
        // the insert itself trips the constraint even without a pre-check.
        let err = User::create(&pool, "Second User", "TestUser@Gmail.com", "stronG@123")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
    }

    #[sqlx::test]
    async fn update_rehashes_changed_password(pool: PgPool) {
        let user = register(&pool, "Update User", "update@gmail.com").await;
        let update = UpdateUserRequest {
            password: Some("NewstronG@123".into()),
            ..Default::default()
        };
        let updated = User::update(&pool, user.id, update)
            .await
            .expect("update")
            .expect("user exists");
        assert!(verify_password("NewstronG@123", &updated.password_hash));
        assert!(!verify_password("stronG@123", &updated.password_hash));
    }

    #[sqlx::test]
    async fn update_absent_user_returns_none(pool: PgPool) {
        let updated = User::update(&pool, 9999, UpdateUserRequest::default())
            .await
            .expect("update");
        assert!(updated.is_none());
    }

    #[sqlx::test]
    async fn delete_cascades_expenses(pool: PgPool) {
        let user = register(&pool, "Delete User", "delete@gmail.com").await;
        for amount in [15.0, 30.0] {
            Expense::create(
                &pool,
                CreateExpenseRequest {
                    amount,
                    description: "Groceries".into(),
                    expense_date: Some(date!(2023 - 10 - 02)),
                    category: Some("Food".into()),
                },
                user.id,
            )
            .await
            .expect("create expense");
        }

        assert!(User::delete(&pool, user.id).await.expect("delete"));

        let orphans: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM expenses WHERE user_id = $1")
                .bind(user.id)
                .fetch_one(&pool)
                .await
                .expect("count");
        assert_eq!(orphans, 0);

        // Second delete of the same id reports absence.
        assert!(!User::delete(&pool, user.id).await.expect("delete"));
    }
}

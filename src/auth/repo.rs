use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::User;

const COLUMNS: &str = "id, google_id, name, email, password_hash, avatar_url, created_at";

impl User {
    /// Find a user by (already lowercased) email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Create an account from local registration.
    pub async fn create_local(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    /// Create an account first seen through Google login. No password hash.
    pub async fn create_from_google(
        db: &PgPool,
        google_id: &str,
        name: &str,
        email: &str,
        avatar_url: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (google_id, name, email, avatar_url)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        ))
        .bind(google_id)
        .bind(name)
        .bind(email)
        .bind(avatar_url)
        .fetch_one(db)
        .await
    }

    /// Attach a google id to an existing local account. The avatar is only
    /// filled in when the record has none; nothing else is touched.
    pub async fn link_google(
        db: &PgPool,
        id: Uuid,
        google_id: &str,
        avatar_url: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET google_id = $2, avatar_url = COALESCE(avatar_url, $3)
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(google_id)
        .bind(avatar_url)
        .fetch_one(db)
        .await
    }
}

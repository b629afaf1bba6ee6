use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
///
/// An account created through local registration carries a password hash;
/// one created through Google login carries a google id. A linked account
/// carries both. Email is stored lowercased and is unique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub google_id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User {
            id: Uuid::new_v4(),
            google_id: None,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: Some("$argon2id$fake".into()),
            avatar_url: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn password_hash_never_serialized() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn public_fields_serialized() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains("ada@example.com"));
        assert!(json.contains("\"name\":\"Ada\""));
        assert!(json.contains("created_at"));
    }
}

use serde::{Deserialize, Serialize};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after register and login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_deserializes() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"name":"Ada","email":"ada@example.com","password":"longpassword1"}"#,
        )
        .unwrap();
        assert_eq!(req.name, "Ada");
        assert_eq!(req.email, "ada@example.com");
    }

    #[test]
    fn token_response_shape() {
        let json = serde_json::to_string(&TokenResponse {
            token: "abc".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"token":"abc"}"#);
    }
}

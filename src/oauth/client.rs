use anyhow::bail;
use serde::Deserialize;

use crate::config::GoogleConfig;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Profile payload from Google's userinfo endpoint. Everything except
/// the subject id is optional on Google's side.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
}

/// Google OAuth plumbing: authorization URL, code exchange, profile fetch.
/// Built once at startup from config and shared through `AppState`.
#[derive(Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    callback_url: String,
}

impl GoogleClient {
    pub fn new(cfg: &GoogleConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: cfg.client_id.clone(),
            client_secret: cfg.client_secret.clone(),
            callback_url: cfg.callback_url.clone(),
        }
    }

    /// Authorization endpoint URL the user agent is redirected to.
    pub fn authorize_url(&self) -> String {
        format!(
            "{AUTH_ENDPOINT}?client_id={}&redirect_uri={}&response_type=code&scope={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.callback_url),
            urlencoding::encode("profile email"),
        )
    }

    /// Exchange the callback code for an access token, then fetch the
    /// profile it grants access to.
    pub async fn exchange_code(&self, code: &str) -> anyhow::Result<GoogleProfile> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.callback_url.as_str()),
        ];

        let response = self.http.post(TOKEN_ENDPOINT).form(&params).send().await?;
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("google token exchange failed: {body}");
        }
        let tokens: TokenExchangeResponse = response.json().await?;

        let response = self
            .http
            .get(USERINFO_ENDPOINT)
            .bearer_auth(&tokens.access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            bail!("google userinfo fetch failed: {}", response.status());
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_client() -> GoogleClient {
        GoogleClient::new(&GoogleConfig {
            client_id: "client-123".into(),
            client_secret: "shh".into(),
            callback_url: "http://localhost:8080/auth/google/callback".into(),
        })
    }

    #[test]
    fn authorize_url_carries_client_and_callback() {
        let url = make_client().authorize_url();
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fgoogle%2Fcallback"
        ));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=profile%20email"));
    }

    #[test]
    fn authorize_url_never_leaks_secret() {
        assert!(!make_client().authorize_url().contains("shh"));
    }

    #[test]
    fn profile_deserializes_with_missing_fields() {
        let p: GoogleProfile = serde_json::from_str(r#"{"sub":"g-1"}"#).unwrap();
        assert_eq!(p.sub, "g-1");
        assert!(p.email.is_none());
        assert!(p.name.is_none());
        assert!(p.picture.is_none());
    }

    #[test]
    fn profile_deserializes_full_payload() {
        let p: GoogleProfile = serde_json::from_str(
            r#"{"sub":"g-1","email":"a@x.com","email_verified":true,
                "name":"Ada","picture":"https://lh3.example/p.png"}"#,
        )
        .unwrap();
        assert_eq!(p.email.as_deref(), Some("a@x.com"));
        assert_eq!(p.name.as_deref(), Some("Ada"));
        assert_eq!(p.picture.as_deref(), Some("https://lh3.example/p.png"));
    }
}

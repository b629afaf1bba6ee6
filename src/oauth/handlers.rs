use axum::{
    extract::{FromRef, Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{jwt::JwtKeys, repo_types::User},
    oauth::client::GoogleProfile,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/google", get(google_start))
        .route("/auth/google/callback", get(google_callback))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

// The token travels in the URL fragment so it never reaches access logs;
// the error marker is not a credential and stays a query parameter.
fn success_redirect(frontend_url: &str, token: &str) -> String {
    format!("{}/#token={}", frontend_url.trim_end_matches('/'), token)
}

fn failure_redirect(frontend_url: &str) -> String {
    format!("{}/?err=oauth", frontend_url.trim_end_matches('/'))
}

#[instrument(skip(state))]
pub async fn google_start(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&state.google.authorize_url())
}

#[instrument(skip(state, query))]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    let frontend = state.config.frontend_url.as_str();

    if let Some(err) = query.error {
        warn!(error = %err, "google callback returned an error");
        return Redirect::temporary(&failure_redirect(frontend));
    }
    let Some(code) = query.code else {
        warn!("google callback missing code");
        return Redirect::temporary(&failure_redirect(frontend));
    };

    let profile = match state.google.exchange_code(&code).await {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "google code exchange failed");
            return Redirect::temporary(&failure_redirect(frontend));
        }
    };

    let user = match resolve_user(&state, &profile).await {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "resolving google profile failed");
            return Redirect::temporary(&failure_redirect(frontend));
        }
    };

    let keys = JwtKeys::from_ref(&state);
    let token = match keys.sign(user.id) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "jwt sign failed");
            return Redirect::temporary(&failure_redirect(frontend));
        }
    };

    info!(user_id = %user.id, "google login");
    Redirect::temporary(&success_redirect(frontend, &token))
}

/// Find-or-create the record for a Google profile. The first Google login
/// against an existing local account links the google id to it; repeat
/// logins resolve to the same record.
async fn resolve_user(state: &AppState, profile: &GoogleProfile) -> anyhow::Result<User> {
    let email = profile
        .email
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("google profile has no email"))?
        .trim()
        .to_lowercase();
    let name = profile.name.as_deref().unwrap_or("Google User");

    match User::find_by_email(&state.db, &email).await? {
        None => {
            let user = User::create_from_google(
                &state.db,
                &profile.sub,
                name,
                &email,
                profile.picture.as_deref(),
            )
            .await?;
            info!(user_id = %user.id, "google account created");
            Ok(user)
        }
        Some(user) if user.google_id.is_none() => {
            let user =
                User::link_google(&state.db, user.id, &profile.sub, profile.picture.as_deref())
                    .await?;
            info!(user_id = %user.id, "google id linked to existing account");
            Ok(user)
        }
        Some(user) => Ok(user),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_rides_the_fragment() {
        let url = success_redirect("http://localhost:3000", "tok.en.123");
        assert_eq!(url, "http://localhost:3000/#token=tok.en.123");
        assert!(!url.contains("?token="));
    }

    #[test]
    fn trailing_slash_collapsed() {
        assert_eq!(
            success_redirect("http://localhost:3000/", "t"),
            "http://localhost:3000/#token=t"
        );
        assert_eq!(
            failure_redirect("http://localhost:3000/"),
            "http://localhost:3000/?err=oauth"
        );
    }

    #[test]
    fn failure_carries_error_marker() {
        assert_eq!(
            failure_redirect("https://app.example.com"),
            "https://app.example.com/?err=oauth"
        );
    }
}

//! Session store and hosted-UI login flow.
//!
//! Sessions live in memory, keyed by a `sid` cookie; restarting the server
//! logs everyone out. The OAuth id token is stored as received and its
//! claims are decoded without signature verification, which matches the
//! trust model of the hosted-UI flow (the token arrived over the backchannel
//! token exchange, not from the browser).

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};
use url::Url;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::FlowsightError;
use super::AppState;

const SESSION_COOKIE: &str = "sid";

/// Identity attached to a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub username: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing)]
    pub id_token: Option<String>,
}

impl SessionUser {
    pub fn guest() -> Self {
        Self {
            username: "Guest".to_string(),
            email: "guest@example.com".to_string(),
            role: "guest".to_string(),
            id_token: None,
        }
    }
}

/// In-memory session map shared across requests.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SessionUser>>>,
}

impl SessionStore {
    pub async fn get(&self, id: Uuid) -> Option<SessionUser> {
        self.inner.read().await.get(&id).cloned()
    }

    pub async fn insert(&self, user: SessionUser) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.write().await.insert(id, user);
        id
    }

    pub async fn remove(&self, id: Uuid) {
        self.inner.write().await.remove(&id);
    }
}

/// Pull the session id out of the Cookie header, if any.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE {
            Uuid::parse_str(value).ok()
        } else {
            None
        }
    })
}

fn session_cookie(id: Uuid) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

/// Decode the claims segment of a JWT without verifying the signature.
fn decode_claims(token: &str) -> Option<serde_json::Value> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// 302, not 307: a redirected POST (logout) must be followed up with a
/// GET against the provider, and 307 would replay the POST.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// GET /hosted-login — redirect to the identity provider's login page.
pub async fn hosted_login(State(state): State<AppState>) -> Response {
    match login_url(&state.auth) {
        Ok(url) => found(&url),
        Err(e) => {
            error!("hosted login is not configured: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Hosted login is not configured",
            )
                .into_response()
        }
    }
}

fn login_url(auth: &AuthConfig) -> crate::error::Result<String> {
    let mut url = provider_url(auth, "/login")?;
    url.query_pairs_mut()
        .append_pair("client_id", &auth.client_id)
        .append_pair("response_type", "code")
        .append_pair("scope", "openid profile email")
        .append_pair("redirect_uri", &auth.redirect_uri);
    Ok(url.into())
}

fn logout_url(auth: &AuthConfig) -> crate::error::Result<String> {
    let mut url = provider_url(auth, "/logout")?;
    url.query_pairs_mut()
        .append_pair("client_id", &auth.client_id)
        .append_pair("logout_uri", &auth.redirect_uri);
    Ok(url.into())
}

fn provider_url(auth: &AuthConfig, path: &str) -> crate::error::Result<Url> {
    Url::parse(&auth.domain)
        .and_then(|base| base.join(path))
        .map_err(|e| {
            FlowsightError::Config(format!("bad auth domain {:?}: {e}", auth.domain))
        })
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: Option<String>,
}

/// GET /callback — exchange the authorization code for tokens and start a
/// logged-in session.
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let Some(code) = query.code else {
        return (StatusCode::BAD_REQUEST, "No code in query params").into_response();
    };

    let auth = &state.auth;
    let result = state
        .http
        .post(format!("{}/oauth2/token", auth.domain))
        .basic_auth(&auth.client_id, Some(&auth.client_secret))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", auth.redirect_uri.as_str()),
        ])
        .send()
        .await;

    let response = match result {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            error!("token exchange rejected: {}", r.status());
            return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed").into_response();
        }
        Err(e) => {
            error!("token exchange failed: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed").into_response();
        }
    };

    let tokens: TokenResponse = match response.json().await {
        Ok(t) => t,
        Err(e) => {
            error!("token response was not JSON: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed").into_response();
        }
    };

    let user = user_from_id_token(tokens.id_token);
    info!("hosted-UI login for {}", user.username);
    let id = state.sessions.insert(user).await;

    (
        [(header::SET_COOKIE, session_cookie(id))],
        found(&auth.redirect_uri),
    )
        .into_response()
}

/// Build a logged-in user from the id token claims; an undecodable token
/// falls back to a guest identity.
fn user_from_id_token(id_token: Option<String>) -> SessionUser {
    let Some(token) = id_token else {
        return SessionUser::guest();
    };
    let Some(claims) = decode_claims(&token) else {
        error!("could not decode id token claims, falling back to guest");
        return SessionUser::guest();
    };

    let username = claims["cognito:username"]
        .as_str()
        .or_else(|| claims["email"].as_str())
        .unwrap_or("Unknown")
        .to_string();
    let email = claims["email"].as_str().unwrap_or("unknown@example.com").to_string();

    SessionUser {
        username,
        email,
        role: "user".to_string(),
        id_token: Some(token),
    }
}

/// POST /logout — destroy the session and send the browser to the
/// provider's logout page.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(id) = session_id(&headers) {
        state.sessions.remove(id).await;
    }
    match logout_url(&state.auth) {
        Ok(url) => found(&url),
        Err(e) => {
            error!("logout redirect is not configured: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Logout is not configured").into_response()
        }
    }
}

/// GET /api/guest-login — create an unauthenticated, role-limited session.
pub async fn guest_login(State(state): State<AppState>) -> Response {
    let user = SessionUser::guest();
    let id = state.sessions.insert(user.clone()).await;
    (
        [(header::SET_COOKIE, session_cookie(id))],
        Json(json!({ "status": "Guest session created", "user": user })),
    )
        .into_response()
}

/// GET /api/session — current user, with guest fallback.
///
/// A request without a session (or whose session has vanished) gets a
/// fresh guest session rather than a 401; the UI treats identity as
/// best-effort.
pub async fn session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(id) = session_id(&headers) {
        if let Some(user) = state.sessions.get(id).await {
            return Json(json!({ "user": user })).into_response();
        }
    }

    let user = SessionUser::guest();
    let id = state.sessions.insert(user.clone()).await;
    (
        [(header::SET_COOKIE, session_cookie(id))],
        Json(json!({ "user": user })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_parses_sid_cookie() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("theme=dark; sid={id}; lang=en").parse().expect("valid header"),
        );
        assert_eq!(session_id(&headers), Some(id));
    }

    #[test]
    fn test_session_id_ignores_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "sid=not-a-uuid".parse().expect("valid header"));
        assert_eq!(session_id(&headers), None);
        assert_eq!(session_id(&HeaderMap::new()), None);
    }

    #[test]
    fn test_decode_claims_without_verification() {
        let claims = json!({ "cognito:username": "jasman", "email": "jasman@example.com" });
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).expect("serialize"));
        let token = format!("eyJhbGciOiJub25lIn0.{payload}.sig");

        let user = user_from_id_token(Some(token));
        assert_eq!(user.username, "jasman");
        assert_eq!(user.email, "jasman@example.com");
        assert_eq!(user.role, "user");
    }

    #[test]
    fn test_undecodable_token_falls_back_to_guest() {
        let user = user_from_id_token(Some("garbage".to_string()));
        assert_eq!(user.role, "guest");
        assert_eq!(user.username, "Guest");
    }

    fn test_auth() -> AuthConfig {
        AuthConfig {
            domain: "https://idp.example.com".to_string(),
            client_id: "abc".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:3000/app".to_string(),
        }
    }

    #[test]
    fn test_login_url_encodes_redirect_uri() {
        let url = login_url(&test_auth()).expect("valid domain");
        assert!(url.starts_with("https://idp.example.com/login?"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fapp"));
        assert!(url.contains("client_id=abc"));
        assert!(url.contains("scope=openid+profile+email"));
    }

    #[test]
    fn test_logout_url_carries_logout_uri() {
        let url = logout_url(&test_auth()).expect("valid domain");
        assert!(url.starts_with("https://idp.example.com/logout?"));
        assert!(url.contains("logout_uri=http%3A%2F%2Flocalhost%3A3000%2Fapp"));
    }

    #[test]
    fn test_provider_urls_require_a_domain() {
        let auth = AuthConfig {
            domain: String::new(),
            ..test_auth()
        };
        assert!(matches!(
            login_url(&auth),
            Err(FlowsightError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_store_round_trip() {
        let store = SessionStore::default();
        let id = store.insert(SessionUser::guest()).await;
        assert_eq!(store.get(id).await.expect("present").role, "guest");
        store.remove(id).await;
        assert!(store.get(id).await.is_none());
    }
}

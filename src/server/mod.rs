//! HTTP surface: thin handlers around the analysis engine, plus the
//! session/user collaborator endpoints the UI depends on.

mod auth;
mod db;

pub use db::{Database, UserRow};

use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::AuthConfig;
use crate::core::Engine;
use crate::error::FlowsightError;
use auth::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub db: Database,
    pub sessions: SessionStore,
    pub auth: AuthConfig,
    pub http: reqwest::Client,
}

/// One analysis request; created per HTTP call, never persisted.
#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub code: String,
    pub language: String,
}

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .engine
        .config()
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE])
        .allow_credentials(true)
        .allow_origin(AllowOrigin::list(origins));

    Router::new()
        .route("/", get(root))
        .route("/api/status", get(status))
        .route("/api/explain", post(explain))
        .route("/api/flowchart", post(flowchart))
        .route("/api/callstack", post(callstack))
        .route("/hosted-login", get(auth::hosted_login))
        .route("/callback", get(auth::oauth_callback))
        .route("/logout", post(auth::logout))
        .route("/api/guest-login", get(auth::guest_login))
        .route("/api/session", get(auth::session))
        .route("/api/users", get(list_users).post(add_user))
        .route("/api/db-test", get(db_test))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve(engine: Engine, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let config = engine.config().clone();
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let db = Database::open(&config.database.path)?;
    if config.database.seed {
        db.seed_if_empty().await?;
    }

    let state = AppState {
        engine: Arc::new(engine),
        db,
        sessions: SessionStore::default(),
        auth: config.auth.clone(),
        http: reqwest::Client::new(),
    };

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    info!("Backend running on http://{host}:{port}");
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

async fn root() -> &'static str {
    "Backend is running"
}

/// GET /api/status — liveness only.
async fn status() -> Json<serde_json::Value> {
    Json(json!({
        "status": "Backend is running",
        "time": Utc::now().to_rfc3339(),
    }))
}

/// Gateway failures become a 500 with a generic message; the detail stays
/// in the log.
fn gateway_failure(operation: &str, err: FlowsightError) -> Response {
    error!("AI gateway error ({operation}): {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": format!("Failed to {operation}") })),
    )
        .into_response()
}

/// POST /api/explain
async fn explain(State(state): State<AppState>, Json(req): Json<AnalysisRequest>) -> Response {
    match state.engine.explain(&req.code, &req.language).await {
        Ok(explanation) => Json(json!({ "explanation": explanation })).into_response(),
        Err(e) => gateway_failure("get AI explanation", e),
    }
}

/// POST /api/flowchart — empty node/edge arrays when the model's reply
/// could not be parsed; 500 only when the gateway call itself failed.
async fn flowchart(State(state): State<AppState>, Json(req): Json<AnalysisRequest>) -> Response {
    match state.engine.flowchart(&req.code, &req.language).await {
        Ok(graph) => Json(graph).into_response(),
        Err(e) => gateway_failure("generate flowchart", e),
    }
}

/// POST /api/callstack
async fn callstack(State(state): State<AppState>, Json(req): Json<AnalysisRequest>) -> Response {
    match state.engine.call_stack(&req.code, &req.language).await {
        Ok(stack) => Json(json!({ "stack": stack })).into_response(),
        Err(e) => gateway_failure("generate call stack", e),
    }
}

/// GET /api/users
async fn list_users(State(state): State<AppState>) -> Response {
    match state.db.list_users().await {
        Ok(users) => Json(users).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct NewUser {
    name: String,
    email: String,
}

/// POST /api/users
async fn add_user(State(state): State<AppState>, Json(user): Json<NewUser>) -> Response {
    if user.name.trim().is_empty() || user.email.trim().is_empty() {
        let err = FlowsightError::Validation("name and email must be non-empty".to_string());
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response();
    }
    match state.db.insert_user(&user.name, &user.email).await {
        Ok(id) => Json(json!({ "status": "User added", "id": id })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

/// GET /api/db-test
async fn db_test(State(state): State<AppState>) -> Response {
    match state.db.probe().await {
        Ok(()) => Json(json!({ "status": "Database connected successfully" })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "Database connection failed", "error": e.to_string() })),
        )
            .into_response(),
    }
}

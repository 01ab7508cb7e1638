use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    auth::Identity,
    db::entities::user,
    routes::{ApiResult, JsonApiResponse},
    services::{ServiceContext, auth_service::AuthSession},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub identifier: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user: user::Model,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        .with_state(state)
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<SessionResponse> {
    let services = ServiceContext::from_state(state.as_ref());
    let session = services
        .auth(&state.auth)
        .register_with_display_name(
            &body.username,
            &body.email,
            &body.password,
            body.display_name.as_deref(),
        )
        .await?;
    JsonApiResponse::with_status(StatusCode::CREATED, "account created", session.into())
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<SessionResponse> {
    let services = ServiceContext::from_state(state.as_ref());
    let session = services
        .auth(&state.auth)
        .authenticate(&body.identifier, &body.password, body.remember)
        .await?;
    JsonApiResponse::ok(session.into())
}

async fn logout(State(state): State<Arc<AppState>>, identity: Identity) -> ApiResult<MessageResponse> {
    let services = ServiceContext::from_state(state.as_ref());
    services.auth(&state.auth).logout(&identity).await;
    JsonApiResponse::ok(MessageResponse::new("Logged out"))
}

async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ForgotPasswordRequest>,
) -> ApiResult<MessageResponse> {
    let services = ServiceContext::from_state(state.as_ref());
    let message = services
        .auth(&state.auth)
        .request_password_reset(&body.email)
        .await?;
    JsonApiResponse::ok(MessageResponse::new(message))
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResetPasswordRequest>,
) -> ApiResult<MessageResponse> {
    let services = ServiceContext::from_state(state.as_ref());
    services
        .auth(&state.auth)
        .reset_password(&body.token, &body.password)
        .await?;
    JsonApiResponse::ok(MessageResponse::new("Password updated. Please log in."))
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<AuthSession> for SessionResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.token,
            token_type: "Bearer",
            expires_at: session.expires_at,
            user: session.user,
        }
    }
}

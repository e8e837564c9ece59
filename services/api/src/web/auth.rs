//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration and login.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Form, Json};
use docsmith_core::ports::PortError;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::credentials::{hash_password, verify_password};
use crate::web::errors::{port_error, HandlerError};
use crate::web::rest::TokenResponse;
use crate::web::state::AppState;

const EMAIL_TAKEN: &str = "Email already registered";
const INVALID_CREDENTIALS: &str = "Invalid credentials";

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// OAuth2-style password form. `username` carries the email.
#[derive(Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

fn issue_token(state: &AppState, user_id: Uuid) -> Result<TokenResponse, HandlerError> {
    state
        .tokens
        .issue(user_id)
        .map(TokenResponse::bearer)
        .map_err(|e| {
            error!("Failed to issue token for {}: {}", user_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to issue token".to_string(),
            )
        })
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create a new account and return a token for it
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = TokenResponse),
        (status = 400, description = "Email already registered or fields missing"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Email and password are required".to_string(),
        ));
    }

    // 1. Reject known emails before doing any hashing work
    match state.db.get_user_by_email(email).await {
        Ok(_) => return Err((StatusCode::BAD_REQUEST, EMAIL_TAKEN.to_string())),
        Err(PortError::NotFound(_)) => {}
        Err(e) => return Err(port_error("User", e)),
    }

    // 2. Hash the password
    let password_hash = hash_password(&req.password).map_err(|e| {
        error!("{}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to hash password".to_string(),
        )
    })?;

    // 3. Create the user; a concurrent registration surfaces as a conflict
    let name = req.name.as_deref().filter(|n| !n.trim().is_empty());
    let user = state
        .db
        .create_user(email, name, &password_hash)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => (StatusCode::BAD_REQUEST, EMAIL_TAKEN.to_string()),
            other => port_error("User", other),
        })?;

    info!("Registered user {}", user.id);
    Ok(Json(issue_token(&state, user.id)?))
}

/// POST /auth/token - Exchange email and password for a token
#[utoipa::path(
    post,
    path = "/auth/token",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn token_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, HandlerError> {
    let invalid = || (StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS.to_string());

    let credentials = state
        .db
        .get_user_by_email(form.username.trim())
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => invalid(),
            other => port_error("User", other),
        })?;

    if !verify_password(&form.password, &credentials.password_hash) {
        return Err(invalid());
    }

    Ok(Json(issue_token(&state, credentials.user_id)?))
}

//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::Response,
};
use docsmith_core::ports::PortError;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::credentials::{extract_bearer, BearerError};
use crate::web::errors::HandlerError;
use crate::web::state::AppState;

/// The caller resolved from a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

fn unauthorized(message: impl Into<String>) -> HandlerError {
    let message = message.into();
    warn!("Rejected request: {}", message);
    (StatusCode::UNAUTHORIZED, message)
}

/// Middleware that validates the bearer token and loads its user.
///
/// If valid, inserts an `AuthenticatedUser` into request extensions for handlers to use.
/// A missing or malformed header, or an invalid or expired token, is 401.
/// A token whose user no longer exists is 404.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HandlerError> {
    // 1. Pull the token out of the Authorization header
    let header_value = match req.headers().get(header::AUTHORIZATION) {
        None => None,
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| unauthorized(BearerError::Malformed.to_string()))?,
        ),
    };
    let token = extract_bearer(header_value).map_err(|e| unauthorized(e.to_string()))?;

    // 2. Verify signature and expiry, then read the subject
    let user_id = state
        .tokens
        .decode(token)
        .and_then(|claims| claims.user_id())
        .ok_or_else(|| unauthorized("Invalid token"))?;

    // 3. Resolve the user
    let user = state.db.get_user_by_id(user_id).await.map_err(|e| match e {
        PortError::NotFound(_) => {
            debug!("Token subject {} no longer exists", user_id);
            (StatusCode::NOT_FOUND, "User not found".to_string())
        }
        other => {
            error!("Failed to load token subject {}: {}", user_id, other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    })?;

    // 4. Insert the caller into request extensions
    req.extensions_mut().insert(AuthenticatedUser {
        user_id: user.id,
    });

    // 5. Continue to the handler
    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = HandlerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| unauthorized(BearerError::Missing.to_string()))
    }
}

/// Lets handlers on routes that may run without `require_auth` take
/// `Option<AuthenticatedUser>`.
impl<S> OptionalFromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthenticatedUser>().cloned())
    }
}

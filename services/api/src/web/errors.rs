//! services/api/src/web/errors.rs
//!
//! Translation of port failures into HTTP responses.

use axum::http::StatusCode;
use docsmith_core::ports::PortError;
use tracing::error;

/// The error half of every handler's return type.
pub type HandlerError = (StatusCode, String);

/// Maps a port failure to a status code and client-facing message.
///
/// `what` names the entity for not-found responses ("Project", "Node").
/// Unexpected failures are logged and reported without detail.
pub fn port_error(what: &str, err: PortError) -> HandlerError {
    match err {
        PortError::NotFound(_) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
        PortError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg),
        PortError::Unexpected(msg) => {
            error!("{} operation failed: {}", what, msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

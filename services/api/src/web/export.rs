//! services/api/src/web/export.rs
//!
//! Renders a project into a downloadable DOCX or PPTX file.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
};
use docsmith_core::assembly::build_outline;
use docsmith_core::domain::{DocType, UnknownDocType};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::IntoParams;
use uuid::Uuid;

use crate::web::errors::{port_error, HandlerError};
use crate::web::middleware::AuthenticatedUser;
use crate::web::projects::owned_project;
use crate::web::state::AppState;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportParams {
    /// `docx` or `pptx`. Defaults to the project's own type.
    pub format: Option<String>,
}

/// Builds `attachment; filename="<stem>.<ext>"`, replacing characters that
/// would break the quoted string.
pub fn content_disposition(title: &str, doc_type: DocType) -> String {
    let stem = if title.trim().is_empty() {
        doc_type.default_file_stem().to_string()
    } else {
        title
            .chars()
            .map(|c| match c {
                '"' | '\\' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect()
    };
    format!("attachment; filename=\"{}.{}\"", stem, doc_type.extension())
}

fn internal(message: &str) -> HandlerError {
    (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
}

/// POST /projects/{project_id}/export - Download the project as a file
#[utoipa::path(
    post,
    path = "/projects/{project_id}/export",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ExportParams
    ),
    responses(
        (status = 200, description = "The rendered file", content_type = "application/octet-stream"),
        (status = 400, description = "Unsupported format"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer" = []))
)]
pub async fn export_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
    Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse, HandlerError> {
    // 1. Ownership check
    let project = owned_project(&state, user.user_id, project_id).await?;

    // 2. Resolve the output format
    let doc_type = match params.format.as_deref() {
        Some(format) => format
            .parse::<DocType>()
            .map_err(|e: UnknownDocType| (StatusCode::BAD_REQUEST, e.to_string()))?,
        None => project.doc_type,
    };

    // 3. Assemble and render off the async runtime
    let disposition = content_disposition(&project.title, doc_type);
    let outline = build_outline(&project, doc_type);
    let renderer = state.renderer_for(doc_type);
    let bytes = tokio::task::spawn_blocking(move || renderer.render(&outline))
        .await
        .map_err(|e| {
            error!("Render task for project {} failed: {}", project_id, e);
            internal("Failed to render document")
        })?
        .map_err(|e| port_error("Project", e))?;

    info!(
        "Exported project {} as {} ({} bytes)",
        project_id,
        doc_type,
        bytes.len()
    );

    // 4. Stream the file back
    let disposition = HeaderValue::from_bytes(disposition.as_bytes()).map_err(|e| {
        error!("Unrepresentable filename for project {}: {}", project_id, e);
        internal("Failed to build response headers")
    })?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(doc_type.media_type())),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(bytes),
    ))
}

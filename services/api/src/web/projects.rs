//! services/api/src/web/projects.rs
//!
//! Project endpoints: create, list, fetch, delete, and adding nodes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use docsmith_core::domain::{DocType, NewNode, NewProject, Project, UnknownDocType};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::errors::{port_error, HandlerError};
use crate::web::middleware::AuthenticatedUser;
use crate::web::rest::{NodeResponse, ProjectResponse};
use crate::web::state::AppState;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateNodeRequest {
    pub title: String,
    pub idx: i32,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    pub title: String,
    /// `docx` or `pptx`.
    pub doc_type: String,
    pub main_prompt: Option<String>,
    #[serde(default)]
    pub nodes: Vec<CreateNodeRequest>,
}

impl From<CreateNodeRequest> for NewNode {
    fn from(req: CreateNodeRequest) -> Self {
        NewNode {
            title: req.title,
            idx: req.idx,
        }
    }
}

//=========================================================================================
// Ownership
//=========================================================================================

/// Loads a project the caller owns. Someone else's project is reported
/// exactly like a missing one.
pub(crate) async fn owned_project(
    state: &AppState,
    user_id: Uuid,
    project_id: Uuid,
) -> Result<Project, HandlerError> {
    let project = state
        .db
        .get_project(project_id)
        .await
        .map_err(|e| port_error("Project", e))?;
    if project.user_id != user_id {
        return Err((StatusCode::NOT_FOUND, "Project not found".to_string()));
    }
    Ok(project)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /projects - Create a project with optional initial nodes
#[utoipa::path(
    post,
    path = "/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 200, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Unsupported doc_type"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = []))
)]
pub async fn create_project_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(req): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let doc_type: DocType = req
        .doc_type
        .parse()
        .map_err(|e: UnknownDocType| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let new_project = NewProject {
        title: req.title,
        doc_type,
        main_prompt: req.main_prompt,
        nodes: req.nodes.into_iter().map(NewNode::from).collect(),
    };

    let project = state
        .db
        .create_project(user.user_id, new_project)
        .await
        .map_err(|e| port_error("Project", e))?;

    info!(
        "User {} created {} project {} with {} nodes",
        user.user_id,
        project.doc_type,
        project.id,
        project.nodes.len()
    );
    Ok(Json(ProjectResponse::from(project)))
}

/// GET /projects - List the caller's projects
#[utoipa::path(
    get,
    path = "/projects",
    responses(
        (status = 200, description = "The caller's projects", body = [ProjectResponse]),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = []))
)]
pub async fn list_projects_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, HandlerError> {
    let projects = state
        .db
        .list_projects_for_user(user.user_id)
        .await
        .map_err(|e| port_error("Project", e))?;

    let response: Vec<ProjectResponse> = projects.into_iter().map(ProjectResponse::from).collect();
    Ok(Json(response))
}

/// GET /projects/{project_id} - Fetch one project with its nodes
#[utoipa::path(
    get,
    path = "/projects/{project_id}",
    params(("project_id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "The project", body = ProjectResponse),
        (status = 404, description = "Project not found")
    ),
    security(("bearer" = []))
)]
pub async fn get_project_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let project = owned_project(&state, user.user_id, project_id).await?;
    Ok(Json(ProjectResponse::from(project)))
}

/// DELETE /projects/{project_id} - Delete a project and everything under it
#[utoipa::path(
    delete,
    path = "/projects/{project_id}",
    params(("project_id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer" = []))
)]
pub async fn delete_project_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    owned_project(&state, user.user_id, project_id).await?;
    state
        .db
        .delete_project(project_id)
        .await
        .map_err(|e| port_error("Project", e))?;

    info!("User {} deleted project {}", user.user_id, project_id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /projects/{project_id}/nodes - Append a node to a project
#[utoipa::path(
    post,
    path = "/projects/{project_id}/nodes",
    params(("project_id" = Uuid, Path, description = "Project id")),
    request_body = CreateNodeRequest,
    responses(
        (status = 200, description = "Node created", body = NodeResponse),
        (status = 404, description = "Project not found")
    ),
    security(("bearer" = []))
)]
pub async fn add_node_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateNodeRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    owned_project(&state, user.user_id, project_id).await?;
    let node = state
        .db
        .add_node(project_id, NewNode::from(req))
        .await
        .map_err(|e| port_error("Project", e))?;
    Ok(Json(NodeResponse::from(node)))
}

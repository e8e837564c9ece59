//! services/api/src/web/nodes.rs
//!
//! Node endpoints: detail, manual edits, AI generation and refinement,
//! and the revision and comment logs.
//!
//! `get_node_handler`, `generate_handler` and `refine_handler` take an
//! optional caller. The router decides whether they sit behind
//! `require_auth`; without it they resolve the node by id alone and
//! attribute revisions to the project owner.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use docsmith_core::domain::{NewRevision, Node, NodeEdit};
use docsmith_core::prompts::{generation_prompt, refinement_prompt};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::errors::{port_error, HandlerError};
use crate::web::middleware::AuthenticatedUser;
use crate::web::projects::owned_project;
use crate::web::rest::{CommentResponse, NodeEnvelope, NodeResponse, RevisionResponse};
use crate::web::state::AppState;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema, Default)]
pub struct EditNodeRequest {
    pub title: Option<String>,
    pub idx: Option<i32>,
    pub content_current: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RefineRequest {
    pub refinement_prompt: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CommentRequest {
    pub text: String,
}

//=========================================================================================
// Node Resolution
//=========================================================================================

/// A node plus what the generation pipeline needs from its project.
struct ResolvedNode {
    node: Node,
    main_prompt: Option<String>,
    /// Who the resulting revision is attributed to.
    author: Uuid,
}

async fn resolve_node(
    state: &AppState,
    caller: Option<AuthenticatedUser>,
    project_id: Uuid,
    node_id: Uuid,
) -> Result<ResolvedNode, HandlerError> {
    let project = match caller {
        Some(user) => owned_project(state, user.user_id, project_id).await?,
        None if state.config.public_node_endpoints => state
            .db
            .get_project(project_id)
            .await
            .map_err(|e| port_error("Node", e))?,
        None => {
            warn!("Node route reached without a caller while public access is off");
            return Err((StatusCode::UNAUTHORIZED, "Not authenticated".to_string()));
        }
    };

    let node = state
        .db
        .get_node(project.id, node_id)
        .await
        .map_err(|e| port_error("Node", e))?;

    Ok(ResolvedNode {
        node,
        author: project.user_id,
        main_prompt: project.main_prompt,
    })
}

/// Ownership-checked lookup for the routes that always require a caller.
async fn owned_node(
    state: &AppState,
    user: &AuthenticatedUser,
    project_id: Uuid,
    node_id: Uuid,
) -> Result<Node, HandlerError> {
    owned_project(state, user.user_id, project_id).await?;
    state
        .db
        .get_node(project_id, node_id)
        .await
        .map_err(|e| port_error("Node", e))
}

/// Stores generated text on the node and appends the matching revision.
async fn record_generation(
    state: &AppState,
    resolved: &ResolvedNode,
    prompt: String,
    result: String,
) -> Result<Node, HandlerError> {
    let node = state
        .db
        .update_node_content(resolved.node.id, &result)
        .await
        .map_err(|e| port_error("Node", e))?;

    state
        .db
        .create_revision(NewRevision {
            node_id: node.id,
            user_id: resolved.author,
            prompt_text: prompt,
            result_text: result,
            feedback: None,
        })
        .await
        .map_err(|e| port_error("Node", e))?;

    Ok(node)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /projects/{project_id}/nodes/{node_id} - Node detail
#[utoipa::path(
    get,
    path = "/projects/{project_id}/nodes/{node_id}",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("node_id" = Uuid, Path, description = "Node id")
    ),
    responses(
        (status = 200, description = "The node", body = NodeResponse),
        (status = 404, description = "Project or node not found")
    ),
    security((), ("bearer" = []))
)]
pub async fn get_node_handler(
    State(state): State<Arc<AppState>>,
    caller: Option<AuthenticatedUser>,
    Path((project_id, node_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, HandlerError> {
    let resolved = resolve_node(&state, caller, project_id, node_id).await?;
    Ok(Json(NodeResponse::from(resolved.node)))
}

/// PUT /projects/{project_id}/nodes/{node_id} - Manually edit a node
#[utoipa::path(
    put,
    path = "/projects/{project_id}/nodes/{node_id}",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("node_id" = Uuid, Path, description = "Node id")
    ),
    request_body = EditNodeRequest,
    responses(
        (status = 200, description = "The updated node", body = NodeResponse),
        (status = 404, description = "Project or node not found")
    ),
    security(("bearer" = []))
)]
pub async fn edit_node_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path((project_id, node_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<EditNodeRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let node = owned_node(&state, &user, project_id, node_id).await?;
    let edit = NodeEdit {
        title: req.title,
        idx: req.idx,
        content_current: req.content_current,
    };
    let node = state
        .db
        .edit_node(node.id, edit)
        .await
        .map_err(|e| port_error("Node", e))?;
    Ok(Json(NodeResponse::from(node)))
}

/// POST /projects/{project_id}/nodes/{node_id}/generate - Write the node with the LLM
#[utoipa::path(
    post,
    path = "/projects/{project_id}/nodes/{node_id}/generate",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("node_id" = Uuid, Path, description = "Node id")
    ),
    responses(
        (status = 200, description = "The node with its new content", body = NodeEnvelope),
        (status = 404, description = "Project or node not found")
    ),
    security((), ("bearer" = []))
)]
pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    caller: Option<AuthenticatedUser>,
    Path((project_id, node_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, HandlerError> {
    let resolved = resolve_node(&state, caller, project_id, node_id).await?;

    let prompt = generation_prompt(
        resolved.node.title.as_deref(),
        resolved.main_prompt.as_deref(),
    );
    let result = state.generator.generate(&prompt).await;
    let node = record_generation(&state, &resolved, prompt, result).await?;

    info!("Generated content for node {}", node.id);
    Ok(Json(NodeEnvelope { node: node.into() }))
}

/// POST /projects/{project_id}/nodes/{node_id}/refine - Rewrite the node per an instruction
#[utoipa::path(
    post,
    path = "/projects/{project_id}/nodes/{node_id}/refine",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("node_id" = Uuid, Path, description = "Node id")
    ),
    request_body = RefineRequest,
    responses(
        (status = 200, description = "The node with its refined content", body = NodeEnvelope),
        (status = 404, description = "Project or node not found")
    ),
    security((), ("bearer" = []))
)]
pub async fn refine_handler(
    State(state): State<Arc<AppState>>,
    caller: Option<AuthenticatedUser>,
    Path((project_id, node_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<RefineRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let resolved = resolve_node(&state, caller, project_id, node_id).await?;

    let prompt = refinement_prompt(
        resolved.node.title.as_deref(),
        resolved.node.content_current.as_deref(),
        &req.refinement_prompt,
    );
    let result = state.generator.generate(&prompt).await;
    let node = record_generation(&state, &resolved, prompt, result).await?;

    info!("Refined content for node {}", node.id);
    Ok(Json(NodeEnvelope { node: node.into() }))
}

/// GET /projects/{project_id}/nodes/{node_id}/revisions - Generation history, oldest first
#[utoipa::path(
    get,
    path = "/projects/{project_id}/nodes/{node_id}/revisions",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("node_id" = Uuid, Path, description = "Node id")
    ),
    responses(
        (status = 200, description = "The node's revisions", body = [RevisionResponse]),
        (status = 404, description = "Project or node not found")
    ),
    security(("bearer" = []))
)]
pub async fn list_revisions_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path((project_id, node_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, HandlerError> {
    let node = owned_node(&state, &user, project_id, node_id).await?;
    let revisions = state
        .db
        .list_revisions(node.id)
        .await
        .map_err(|e| port_error("Node", e))?;

    let response: Vec<RevisionResponse> =
        revisions.into_iter().map(RevisionResponse::from).collect();
    Ok(Json(response))
}

/// POST /projects/{project_id}/nodes/{node_id}/comments - Annotate a node
#[utoipa::path(
    post,
    path = "/projects/{project_id}/nodes/{node_id}/comments",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("node_id" = Uuid, Path, description = "Node id")
    ),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Empty comment"),
        (status = 404, description = "Project or node not found")
    ),
    security(("bearer" = []))
)]
pub async fn add_comment_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path((project_id, node_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<CommentRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    if req.text.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Comment text is required".to_string()));
    }
    let node = owned_node(&state, &user, project_id, node_id).await?;
    let comment = state
        .db
        .add_comment(node.id, user.user_id, &req.text)
        .await
        .map_err(|e| port_error("Node", e))?;
    Ok(Json(CommentResponse::from(comment)))
}

/// GET /projects/{project_id}/nodes/{node_id}/comments - Comments, oldest first
#[utoipa::path(
    get,
    path = "/projects/{project_id}/nodes/{node_id}/comments",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("node_id" = Uuid, Path, description = "Node id")
    ),
    responses(
        (status = 200, description = "The node's comments", body = [CommentResponse]),
        (status = 404, description = "Project or node not found")
    ),
    security(("bearer" = []))
)]
pub async fn list_comments_handler(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path((project_id, node_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, HandlerError> {
    let node = owned_node(&state, &user, project_id, node_id).await?;
    let comments = state
        .db
        .list_comments(node.id)
        .await
        .map_err(|e| port_error("Node", e))?;

    let response: Vec<CommentResponse> = comments.into_iter().map(CommentResponse::from).collect();
    Ok(Json(response))
}

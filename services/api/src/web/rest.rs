//! services/api/src/web/rest.rs
//!
//! Response payloads shared by the REST handlers and the master
//! definition for the OpenAPI specification.

use chrono::{DateTime, Utc};
use docsmith_core::domain::{Comment, Node, Project, Revision};
use serde::Serialize;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::{auth, export, nodes, projects};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::token_handler,
        projects::create_project_handler,
        projects::list_projects_handler,
        projects::get_project_handler,
        projects::delete_project_handler,
        projects::add_node_handler,
        nodes::get_node_handler,
        nodes::edit_node_handler,
        nodes::generate_handler,
        nodes::refine_handler,
        nodes::list_revisions_handler,
        nodes::add_comment_handler,
        nodes::list_comments_handler,
        export::export_handler,
    ),
    components(
        schemas(
            TokenResponse,
            ProjectResponse,
            NodeResponse,
            NodeEnvelope,
            RevisionResponse,
            CommentResponse,
            auth::RegisterRequest,
            auth::LoginForm,
            projects::CreateProjectRequest,
            projects::CreateNodeRequest,
            nodes::EditNodeRequest,
            nodes::RefineRequest,
            nodes::CommentRequest,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Document Generation API", description = "Projects, AI-written sections and DOCX/PPTX export.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by the protected paths.
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// API Response Structs
//=========================================================================================

/// Returned by registration and login.
#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct NodeResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: Option<String>,
    pub idx: i32,
    pub content_current: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Node> for NodeResponse {
    fn from(node: Node) -> Self {
        Self {
            id: node.id,
            project_id: node.project_id,
            title: node.title,
            idx: node.idx,
            content_current: node.content_current,
            created_at: node.created_at,
        }
    }
}

/// Wrapper returned by the generate and refine endpoints.
#[derive(Serialize, ToSchema)]
pub struct NodeEnvelope {
    pub node: NodeResponse,
}

#[derive(Serialize, ToSchema)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub title: String,
    pub doc_type: String,
    pub main_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub nodes: Vec<NodeResponse>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            title: project.title,
            doc_type: project.doc_type.to_string(),
            main_prompt: project.main_prompt,
            created_at: project.created_at,
            updated_at: project.updated_at,
            nodes: project.nodes.into_iter().map(NodeResponse::from).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct RevisionResponse {
    pub id: Uuid,
    pub node_id: Uuid,
    pub user_id: Uuid,
    pub prompt_text: String,
    pub result_text: String,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Revision> for RevisionResponse {
    fn from(revision: Revision) -> Self {
        Self {
            id: revision.id,
            node_id: revision.node_id,
            user_id: revision.user_id,
            prompt_text: revision.prompt_text,
            result_text: revision.result_text,
            feedback: revision.feedback.map(|f| f.as_str().to_string()),
            created_at: revision.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: Uuid,
    pub node_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            node_id: comment.node_id,
            user_id: comment.user_id,
            text: comment.comment_text,
            created_at: comment.created_at,
        }
    }
}

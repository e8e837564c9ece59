//! crates/docsmith_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::assembly::DocumentOutline;
use crate::domain::{
    Comment, NewNode, NewProject, NewRevision, Node, NodeEdit, Project, Revision, User,
    UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Entity store. Every method is one atomic unit of work.
///
/// Lookups by id do not check ownership; callers compare `user_id` themselves.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users ---
    /// Fails with `PortError::Conflict` when the email is already registered.
    async fn create_user(
        &self,
        email: &str,
        name: Option<&str>,
        password_hash: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    // --- Projects ---
    /// Creates the project and its initial nodes in a single transaction.
    async fn create_project(&self, user_id: Uuid, project: NewProject) -> PortResult<Project>;

    async fn get_project(&self, project_id: Uuid) -> PortResult<Project>;

    async fn list_projects_for_user(&self, user_id: Uuid) -> PortResult<Vec<Project>>;

    /// Deletes the project; its nodes, revisions and comments go with it.
    async fn delete_project(&self, project_id: Uuid) -> PortResult<()>;

    // --- Nodes ---
    async fn add_node(&self, project_id: Uuid, node: NewNode) -> PortResult<Node>;

    /// Looks a node up within a project; a node of another project is `NotFound`.
    async fn get_node(&self, project_id: Uuid, node_id: Uuid) -> PortResult<Node>;

    /// Replaces `content_current` only.
    async fn update_node_content(&self, node_id: Uuid, content: &str) -> PortResult<Node>;

    async fn edit_node(&self, node_id: Uuid, edit: NodeEdit) -> PortResult<Node>;

    // --- Revisions and Comments ---
    async fn create_revision(&self, revision: NewRevision) -> PortResult<Revision>;

    async fn list_revisions(&self, node_id: Uuid) -> PortResult<Vec<Revision>>;

    async fn add_comment(&self, node_id: Uuid, user_id: Uuid, text: &str) -> PortResult<Comment>;

    async fn list_comments(&self, node_id: Uuid) -> PortResult<Vec<Comment>>;
}

/// Text returned by a `TextGenerationService` in place of content when the
/// upstream model call fails.
pub const GENERATION_ERROR_TEXT: &str = "⚠️ Error generating content";

#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Sends a prompt to the model and returns its text.
    ///
    /// Never fails: upstream errors are logged and turned into
    /// [`GENERATION_ERROR_TEXT`]. One attempt per call.
    async fn generate(&self, prompt: &str) -> String;
}

/// Serializes an assembled outline into one binary file format.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, outline: &DocumentOutline) -> PortResult<Vec<u8>>;
}

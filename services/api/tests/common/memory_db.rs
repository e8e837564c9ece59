//! In-memory `DatabaseService` with the same observable behaviour as the
//! Postgres adapter: unique emails, insertion-ordered nodes and cascading
//! project deletes.

use async_trait::async_trait;
use chrono::Utc;
use docsmith_core::domain::{
    Comment, NewNode, NewProject, NewRevision, Node, NodeEdit, Project, Revision, User,
    UserCredentials,
};
use docsmith_core::ports::{DatabaseService, PortError, PortResult};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Store {
    users: Vec<(User, String)>,
    /// Projects without their nodes; nodes live in `nodes`.
    projects: Vec<Project>,
    nodes: Vec<Node>,
    revisions: Vec<Revision>,
    comments: Vec<Comment>,
}

impl Store {
    fn assemble(&self, project: &Project) -> Project {
        let mut project = project.clone();
        project.nodes = self
            .nodes
            .iter()
            .filter(|n| n.project_id == project.id)
            .cloned()
            .collect();
        project
    }

    fn node_mut(&mut self, node_id: Uuid) -> PortResult<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .ok_or_else(|| PortError::NotFound(format!("Node {} not found", node_id)))
    }

    fn push_node(&mut self, project_id: Uuid, node: NewNode) -> Node {
        let node = Node {
            id: Uuid::new_v4(),
            project_id,
            idx: node.idx,
            title: Some(node.title),
            content_current: None,
            created_at: Utc::now(),
        };
        self.nodes.push(node.clone());
        node
    }
}

#[derive(Default)]
pub struct InMemoryDb {
    store: Mutex<Store>,
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total revisions across all nodes.
    pub fn revision_count(&self) -> usize {
        self.store.lock().unwrap().revisions.len()
    }

    pub fn comment_count(&self) -> usize {
        self.store.lock().unwrap().comments.len()
    }

    pub fn node_count(&self) -> usize {
        self.store.lock().unwrap().nodes.len()
    }
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    async fn create_user(
        &self,
        email: &str,
        name: Option<&str>,
        password_hash: &str,
    ) -> PortResult<User> {
        let mut store = self.store.lock().unwrap();
        if store.users.iter().any(|(u, _)| u.email == email) {
            return Err(PortError::Conflict(format!("Email {} already registered", email)));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.map(str::to_string),
            created_at: Utc::now(),
        };
        store.users.push((user.clone(), password_hash.to_string()));
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let store = self.store.lock().unwrap();
        store
            .users
            .iter()
            .find(|(u, _)| u.email == email)
            .map(|(u, hash)| UserCredentials {
                user_id: u.id,
                email: u.email.clone(),
                password_hash: hash.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let store = self.store.lock().unwrap();
        store
            .users
            .iter()
            .find(|(u, _)| u.id == user_id)
            .map(|(u, _)| u.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn create_project(&self, user_id: Uuid, project: NewProject) -> PortResult<Project> {
        let mut store = self.store.lock().unwrap();
        let now = Utc::now();
        let created = Project {
            id: Uuid::new_v4(),
            user_id,
            title: project.title,
            doc_type: project.doc_type,
            main_prompt: project.main_prompt,
            created_at: now,
            updated_at: now,
            nodes: Vec::new(),
        };
        store.projects.push(created.clone());
        for node in project.nodes {
            store.push_node(created.id, node);
        }
        Ok(store.assemble(&created))
    }

    async fn get_project(&self, project_id: Uuid) -> PortResult<Project> {
        let store = self.store.lock().unwrap();
        store
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .map(|p| store.assemble(p))
            .ok_or_else(|| PortError::NotFound(format!("Project {} not found", project_id)))
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> PortResult<Vec<Project>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .projects
            .iter()
            .filter(|p| p.user_id == user_id)
            .map(|p| store.assemble(p))
            .collect())
    }

    async fn delete_project(&self, project_id: Uuid) -> PortResult<()> {
        let mut store = self.store.lock().unwrap();
        let before = store.projects.len();
        store.projects.retain(|p| p.id != project_id);
        if store.projects.len() == before {
            return Err(PortError::NotFound(format!("Project {} not found", project_id)));
        }
        let removed: Vec<Uuid> = store
            .nodes
            .iter()
            .filter(|n| n.project_id == project_id)
            .map(|n| n.id)
            .collect();
        store.nodes.retain(|n| n.project_id != project_id);
        store.revisions.retain(|r| !removed.contains(&r.node_id));
        store.comments.retain(|c| !removed.contains(&c.node_id));
        Ok(())
    }

    async fn add_node(&self, project_id: Uuid, node: NewNode) -> PortResult<Node> {
        let mut store = self.store.lock().unwrap();
        if !store.projects.iter().any(|p| p.id == project_id) {
            return Err(PortError::NotFound(format!("Project {} not found", project_id)));
        }
        Ok(store.push_node(project_id, node))
    }

    async fn get_node(&self, project_id: Uuid, node_id: Uuid) -> PortResult<Node> {
        let store = self.store.lock().unwrap();
        store
            .nodes
            .iter()
            .find(|n| n.id == node_id && n.project_id == project_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Node {} not found", node_id)))
    }

    async fn update_node_content(&self, node_id: Uuid, content: &str) -> PortResult<Node> {
        let mut store = self.store.lock().unwrap();
        let node = store.node_mut(node_id)?;
        node.content_current = Some(content.to_string());
        Ok(node.clone())
    }

    async fn edit_node(&self, node_id: Uuid, edit: NodeEdit) -> PortResult<Node> {
        let mut store = self.store.lock().unwrap();
        let node = store.node_mut(node_id)?;
        if let Some(title) = edit.title {
            node.title = Some(title);
        }
        if let Some(idx) = edit.idx {
            node.idx = idx;
        }
        if let Some(content) = edit.content_current {
            node.content_current = Some(content);
        }
        Ok(node.clone())
    }

    async fn create_revision(&self, revision: NewRevision) -> PortResult<Revision> {
        let mut store = self.store.lock().unwrap();
        store.node_mut(revision.node_id)?;
        let created = Revision {
            id: Uuid::new_v4(),
            node_id: revision.node_id,
            user_id: revision.user_id,
            prompt_text: revision.prompt_text,
            result_text: revision.result_text,
            feedback: revision.feedback,
            created_at: Utc::now(),
        };
        store.revisions.push(created.clone());
        Ok(created)
    }

    async fn list_revisions(&self, node_id: Uuid) -> PortResult<Vec<Revision>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .revisions
            .iter()
            .filter(|r| r.node_id == node_id)
            .cloned()
            .collect())
    }

    async fn add_comment(&self, node_id: Uuid, user_id: Uuid, text: &str) -> PortResult<Comment> {
        let mut store = self.store.lock().unwrap();
        store.node_mut(node_id)?;
        let comment = Comment {
            id: Uuid::new_v4(),
            node_id,
            user_id,
            comment_text: text.to_string(),
            created_at: Utc::now(),
        };
        store.comments.push(comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, node_id: Uuid) -> PortResult<Vec<Comment>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .comments
            .iter()
            .filter(|c| c.node_id == node_id)
            .cloned()
            .collect())
    }
}

//! crates/docsmith_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Users
//=========================================================================================

/// Represents a registered user - used throughout the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
}

//=========================================================================================
// Projects and Nodes
//=========================================================================================

/// The closed set of output kinds a project can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocType {
    Docx,
    Pptx,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported document type '{0}', expected 'docx' or 'pptx'")]
pub struct UnknownDocType(pub String);

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Docx => "docx",
            DocType::Pptx => "pptx",
        }
    }

    /// File extension used when the rendered file is downloaded.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            DocType::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocType::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
        }
    }

    /// Literal used for the title element when a project has no title.
    pub fn fallback_title(&self) -> &'static str {
        match self {
            DocType::Docx => "Document",
            DocType::Pptx => "Presentation",
        }
    }

    /// File stem used for downloads when a project has no title.
    pub fn default_file_stem(&self) -> &'static str {
        match self {
            DocType::Docx => "document",
            DocType::Pptx => "presentation",
        }
    }
}

impl FromStr for DocType {
    type Err = UnknownDocType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docx" => Ok(DocType::Docx),
            "pptx" => Ok(DocType::Pptx),
            _ => Err(UnknownDocType(s.to_string())),
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document-in-progress together with its nodes.
///
/// `nodes` is kept in insertion order; assembly sorts by `idx` itself.
#[derive(Debug, Clone)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub doc_type: DocType,
    pub main_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub nodes: Vec<Node>,
}

/// One section (docx) or slide (pptx) of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: Uuid,
    pub project_id: Uuid,
    pub idx: i32,
    pub title: Option<String>,
    pub content_current: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a project with its initial nodes.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub doc_type: DocType,
    pub main_prompt: Option<String>,
    pub nodes: Vec<NewNode>,
}

#[derive(Debug, Clone)]
pub struct NewNode {
    pub title: String,
    pub idx: i32,
}

/// A partial manual edit of a node. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct NodeEdit {
    pub title: Option<String>,
    pub idx: Option<i32>,
    pub content_current: Option<String>,
}

//=========================================================================================
// Revisions and Comments
//=========================================================================================

/// User reaction recorded alongside a revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Like,
    Dislike,
}

impl Feedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::Like => "like",
            Feedback::Dislike => "dislike",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "like" => Some(Feedback::Like),
            "dislike" => Some(Feedback::Dislike),
            _ => None,
        }
    }
}

/// Immutable audit record of one generation or refinement attempt.
#[derive(Debug, Clone)]
pub struct Revision {
    pub id: Uuid,
    pub node_id: Uuid,
    pub user_id: Uuid,
    pub prompt_text: String,
    pub result_text: String,
    pub feedback: Option<Feedback>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRevision {
    pub node_id: Uuid,
    pub user_id: Uuid,
    pub prompt_text: String,
    pub result_text: String,
    pub feedback: Option<Feedback>,
}

/// Free-text annotation on a node.
#[derive(Debug, Clone)]
pub struct Comment {
    pub id: Uuid,
    pub node_id: Uuid,
    pub user_id: Uuid,
    pub comment_text: String,
    pub created_at: DateTime<Utc>,
}

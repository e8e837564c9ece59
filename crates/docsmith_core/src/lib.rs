pub mod assembly;
pub mod domain;
pub mod ports;
pub mod prompts;

pub use assembly::{build_outline, BodyLine, DocumentOutline, Section};
pub use domain::{
    Comment, DocType, Feedback, NewNode, NewProject, NewRevision, Node, NodeEdit, Project,
    Revision, User, UserCredentials,
};
pub use ports::{
    DatabaseService, DocumentRenderer, PortError, PortResult, TextGenerationService,
    GENERATION_ERROR_TEXT,
};

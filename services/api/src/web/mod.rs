pub mod auth;
pub mod errors;
pub mod export;
pub mod middleware;
pub mod nodes;
pub mod projects;
pub mod rest;
pub mod router;
pub mod state;

pub use middleware::{require_auth, AuthenticatedUser};
pub use router::build_router;
pub use state::AppState;

//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::credentials::TokenService;
use docsmith_core::domain::DocType;
use docsmith_core::ports::{DatabaseService, DocumentRenderer, TextGenerationService};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub tokens: TokenService,
    pub generator: Arc<dyn TextGenerationService>,
    pub docx_renderer: Arc<dyn DocumentRenderer>,
    pub pptx_renderer: Arc<dyn DocumentRenderer>,
}

impl AppState {
    /// The renderer that writes files of the given type.
    pub fn renderer_for(&self, doc_type: DocType) -> Arc<dyn DocumentRenderer> {
        match doc_type {
            DocType::Docx => self.docx_renderer.clone(),
            DocType::Pptx => self.pptx_renderer.clone(),
        }
    }
}

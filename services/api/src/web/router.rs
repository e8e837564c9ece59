//! services/api/src/web/router.rs
//!
//! Assembles the HTTP surface: routes, auth layering, CORS, tracing and
//! the Swagger UI.

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::{
    auth::{register_handler, token_handler},
    export::export_handler,
    middleware::require_auth,
    nodes::{
        add_comment_handler, edit_node_handler, generate_handler, get_node_handler,
        list_comments_handler, list_revisions_handler, refine_handler,
    },
    projects::{
        add_node_handler, create_project_handler, delete_project_handler, get_project_handler,
        list_projects_handler,
    },
    rest::ApiDoc,
    state::AppState,
};

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);
    match origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            warn!("Ignoring unusable CORS origin '{}'", origin);
            cors
        }
    }
}

/// Builds the complete application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let auth = axum_middleware::from_fn_with_state(state.clone(), require_auth);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/token", post(token_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/projects", post(create_project_handler).get(list_projects_handler))
        .route(
            "/projects/{project_id}",
            get(get_project_handler).delete(delete_project_handler),
        )
        .route("/projects/{project_id}/nodes", post(add_node_handler))
        .route("/projects/{project_id}/nodes/{node_id}", put(edit_node_handler))
        .route(
            "/projects/{project_id}/nodes/{node_id}/revisions",
            get(list_revisions_handler),
        )
        .route(
            "/projects/{project_id}/nodes/{node_id}/comments",
            post(add_comment_handler).get(list_comments_handler),
        )
        .route("/projects/{project_id}/export", post(export_handler))
        .layer(auth.clone());

    // Node detail and generation, protected unless public access is configured
    let node_routes = Router::new()
        .route("/projects/{project_id}/nodes/{node_id}", get(get_node_handler))
        .route(
            "/projects/{project_id}/nodes/{node_id}/generate",
            post(generate_handler),
        )
        .route(
            "/projects/{project_id}/nodes/{node_id}/refine",
            post(refine_handler),
        );
    let node_routes = if state.config.public_node_endpoints {
        warn!("PUBLIC_NODE_ENDPOINTS is on: node detail, generate and refine accept anonymous calls");
        node_routes
    } else {
        node_routes.layer(auth)
    };

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(node_routes)
        .layer(cors_layer(&state.config.cors_allow_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

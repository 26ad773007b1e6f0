//! API route definitions for the record registry.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

/// Create API routes
pub fn api_routes() -> Router<Arc<RwLock<AppState>>> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/registry/state", get(handlers::registry_state))
        // Proof generation
        .route("/api/prove/insertion", post(handlers::prove_insertion))
        .route("/api/prove/membership", post(handlers::prove_membership))
        // Records
        .route("/api/records", post(handlers::register_record))
        .route("/api/records/verify", post(handlers::verify_record))
        .route("/api/verify", post(handlers::verify))
}

/// Full application with middleware and state attached.
pub fn app(state: Arc<RwLock<AppState>>) -> Router {
    Router::new()
        .merge(api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store, snapshot writer and live-match registry
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::ScorerServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<ScorerServices>) -> Router {
    // Scoring routes: require the match's session token.
    let protected = routes::scoring::router().layer(axum::middleware::from_fn(
        middleware::session_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/matches", routes::matches::router().merge(protected))
        .layer(ServiceBuilder::new().layer(Extension(services)))
}

// src/routes.rs

use axum::{
    Router,
    http::Method,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers::assessment, state::AppState};

/// Assembles the main application router.
///
/// * Test links open sessions under `/api/tests`.
/// * Session events live under `/api/sessions`.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let test_routes = Router::new().route("/{slug}/sessions", post(assessment::start_exam));

    let session_routes = Router::new()
        .route("/{id}", get(assessment::get_session))
        .route("/{id}/answers", put(assessment::select_answer))
        .route("/{id}/navigate", post(assessment::navigate))
        .route("/{id}/submit", post(assessment::submit))
        .route("/{id}/history/retry", post(assessment::retry_history));

    Router::new()
        .nest("/api/tests", test_routes)
        .nest("/api/sessions", session_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints reachable by anyone. Those that depend on the viewer resolve the
/// session themselves and answer for guests too.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Load balancer probe.
        .route("/health", get(|| async { "ok" }))
        // GET /api/pages
        // The registry: names, paths, gate requirements, chrome.
        .route("/api/pages", get(handlers::list_pages))
        // GET /api/pages/{name}/decision
        // The caller's allow/deny verdict for one page.
        .route("/api/pages/{name}/decision", get(handlers::page_decision))
        // GET /api/session
        // The session resolved from the caller's token or cookie.
        .route("/api/session", get(handlers::get_session))
}

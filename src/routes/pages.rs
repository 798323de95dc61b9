use crate::{AppState, auth::ViewerSession, handlers, pages::PageRegistry};
use axum::{Router, extract::State, routing::get};

/// Page Router Module
///
/// Mounts every registered page at its path. The gate runs inside `render_page`,
/// against the session resolved for that request.
pub fn page_routes(registry: &PageRegistry) -> Router<AppState> {
    registry.iter().fold(Router::new(), |router, page| {
        let path = page.path.clone();
        let page = page.clone();
        router.route(
            &path,
            get(move |viewer: ViewerSession, State(state): State<AppState>| async move {
                handlers::render_page(viewer, &state, &page)
            }),
        )
    })
}

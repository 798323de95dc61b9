use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    auth::ViewerSession,
    gate::{self, GateEffect},
    models::{GateDecision, PageSummary, Session},
    pages::PageDescriptor,
    session::SessionSnapshot,
};

// --- Page Host ---

/// render_page
///
/// [Page Route] Runs the page's gate against the viewer's session.
///
/// - Allowed: 200 with the shell document.
/// - Unauthenticated: 303 to the sign-in page, carrying `next`.
/// - Forbidden: 303 to the forbidden page.
///
/// Per-request sessions are always resolved, so the loading state never occurs here.
///
/// *Authorization*: the decision comes from `gate::evaluate` alone. The feature slot is
/// only rendered on the allowed branch, so a denied viewer never receives its markup.
///
/// *Security*: the navigation links are filtered by the same session, so the chrome
/// never advertises pages the viewer would be bounced from.
pub fn render_page(
    ViewerSession(session): ViewerSession,
    state: &AppState,
    page: &PageDescriptor,
) -> Response {
    // 1. Gate Evaluation
    let snapshot = SessionSnapshot::Resolved(session);
    let outcome = gate::evaluate(page.gate, &snapshot, &page.path);
    let decision = outcome.decision();

    match outcome.effect {
        // 2a. Denied: carry out the redirect the gate asked for.
        Some(GateEffect::Redirect(destination)) => {
            let location = state.config.redirect_targets().location(&destination);
            tracing::info!(
                page = %page.name,
                ?decision,
                %location,
                "page gate redirected request"
            );
            Redirect::to(&location).into_response()
        }
        // 2b. Allowed: compose chrome and content into one document.
        None => {
            let session = snapshot.session().cloned().unwrap_or_else(Session::guest);
            let links = state.pages.nav_links(&session);
            Html(page.shell().render(&page.title, &links)).into_response()
        }
    }
}

// --- Introspection API ---

/// list_pages
///
/// [Public Route] The page registration surface: every page with its gate and chrome.
#[utoipa::path(
    get,
    path = "/api/pages",
    responses((status = 200, description = "Registered pages", body = [PageSummary]))
)]
pub async fn list_pages(State(state): State<AppState>) -> Json<Vec<PageSummary>> {
    Json(state.pages.summaries())
}

/// page_decision
///
/// [Public Route] The caller's gate decision for a page, without rendering it.
///
/// *Authorization*: uses `gate::decide`, the same rule the page route enforces, so the
/// answer always matches what opening the page would do. Unknown names are a 404.
#[utoipa::path(
    get,
    path = "/api/pages/{name}/decision",
    params(("name" = String, Path, description = "Registered page name")),
    responses(
        (status = 200, description = "Gate decision", body = GateDecision),
        (status = 404, description = "No such page")
    )
)]
pub async fn page_decision(
    ViewerSession(session): ViewerSession,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<GateDecision>, StatusCode> {
    let page = state.pages.get(&name).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(gate::decide(page.gate, &session)))
}

/// get_session
///
/// [Public Route] The session the server resolved for the caller. Guests get the
/// guest session rather than a 401.
///
/// *Security*: only the viewer's own session is echoed; the token itself is never returned.
#[utoipa::path(
    get,
    path = "/api/session",
    responses((status = 200, description = "Resolved session", body = Session))
)]
pub async fn get_session(ViewerSession(session): ViewerSession) -> Json<Session> {
    Json(session)
}

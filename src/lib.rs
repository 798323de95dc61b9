use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Access control core: session state, gate evaluation, page composition.
pub mod features;
pub mod gate;
pub mod navigator;
pub mod pages;
pub mod session;
pub mod shell;

// HTTP page host.
pub mod auth;
pub mod config;
pub mod directory;
pub mod handlers;
pub mod models;
pub mod routes;
use routes::{pages as page_router, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use directory::{DirectoryState, InMemoryUserDirectory, PostgresUserDirectory};
pub use gate::{GateRender, GateState, LiveGate, RedirectTargets, evaluate};
pub use navigator::{Navigator, Screen, ScreenView};
pub use pages::{PageDescriptor, PageRegistry, RegistryState};
pub use session::{SessionProvider, SessionSnapshot, SessionStore};

/// ApiDoc
///
/// OpenAPI document for the JSON surface, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::list_pages, handlers::page_decision, handlers::get_session),
    components(
        schemas(
            models::PageSummary, models::GateDecision, models::DenialReason,
            models::GateRequirement, models::Chrome, models::Session, models::Role,
        )
    ),
    tags(
        (name = "portal-gate", description = "Page registry and access gate API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared across all requests: the profile directory, the immutable page registry,
/// and the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    pub directory: DirectoryState,
    pub pages: RegistryState,
    pub config: AppConfig,
}

impl FromRef<AppState> for DirectoryState {
    fn from_ref(app_state: &AppState) -> DirectoryState {
        app_state.directory.clone()
    }
}

impl FromRef<AppState> for RegistryState {
    fn from_ref(app_state: &AppState) -> RegistryState {
        app_state.pages.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the API routes, one route per registered page, and the observability
/// layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(page_router::page_routes(&state.pages))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Request span carrying the `x-request-id` so every log line of a request correlates.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}

use portal_gate::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    directory::{DirectoryState, InMemoryUserDirectory, PostgresUserDirectory},
    pages::PageRegistry,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, connects the profile directory, builds the
/// page registry and serves the portal.
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "portal_gate=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Portal starting in {:?} mode", config.env);

    let directory: DirectoryState = match &config.db_url {
        Some(db_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await
                .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");
            Arc::new(PostgresUserDirectory::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using an empty in-memory profile directory");
            Arc::new(InMemoryUserDirectory::new())
        }
    };

    let pages = PageRegistry::portal(&config.redirect_targets())
        .expect("FATAL: page registry rejected the portal sitemap");
    tracing::info!(pages = pages.len(), "page registry built");

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState {
        directory,
        pages: Arc::new(pages),
        config,
    });

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: failed to bind BIND_ADDR");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app).await.expect("server error");
}

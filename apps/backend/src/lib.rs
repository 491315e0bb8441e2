pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod seed;
pub mod services;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

/// Build the API router over the given state.
pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/users/me", get(routes::users::me))
        .route("/api/progress/validate", post(routes::progress::validate))
        .route(
            "/api/progress/complete-lesson",
            post(routes::progress::complete_lesson),
        )
        .route("/api/curriculum", get(routes::curriculum::list))
        .route("/api/curriculum/:slug", get(routes::curriculum::detail))
        .route("/api/review/due", get(routes::review::due))
        .route("/api/leaderboard", get(routes::leaderboard::standings))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/users/register", post(routes::users::register))
        .merge(protected_routes)
        .with_state(state)
}

/// Install the global subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Connect and bring the schema up to date.
pub async fn connect_and_migrate(config: &Config) -> anyhow::Result<Database> {
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Running migrations...");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;

    Ok(db)
}

pub async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();

    let db = connect_and_migrate(&config).await?;

    let state = AppState { db: Arc::new(db) };

    let app = build_router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.bind_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

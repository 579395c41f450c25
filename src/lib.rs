use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

use config::Config;
use services::mood::MoodAnalyzer;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub analyzer: MoodAnalyzer,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Result<Self, anyhow::Error> {
        let analyzer = MoodAnalyzer::from_config(&config)?;
        Ok(Self {
            db,
            config: Arc::new(config),
            analyzer,
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login));

    let protected_routes = Router::new()
        .route(
            "/api/entries",
            get(handlers::entries::list_entries).post(handlers::entries::create_entry),
        )
        .route("/api/entries/stats", get(handlers::entries::get_stats))
        .route(
            "/api/entries/:id",
            put(handlers::entries::update_entry).delete(handlers::entries::delete_entry),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

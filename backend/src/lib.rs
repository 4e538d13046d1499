//! Supplies inventory backend
//!
//! Items with an entry/exit ledger, location codes, audit trails and demand
//! metrics, behind a JWT-authenticated JSON API.

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware::from_fn, routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use config::StorageBackend;
use services::{AuditStampBuilder, AuthService, InventoryService};
use store::{
    InventoryStore, MemoryInventoryStore, MemoryUserStore, PgInventoryStore, PgUserStore,
    UserStore,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<AuthService>,
    pub inventory: Arc<InventoryService>,
}

impl AppState {
    /// Wire the services over the given stores
    pub fn new(
        config: Config,
        items: Arc<dyn InventoryStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let auth = AuthService::new(users.clone(), config.jwt.clone());
        let inventory = InventoryService::new(items, AuditStampBuilder::new(users));

        Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
            inventory: Arc::new(inventory),
        }
    }

    /// State backed by process memory
    pub fn in_memory(config: Config) -> Self {
        Self::new(
            config,
            Arc::new(MemoryInventoryStore::new()),
            Arc::new(MemoryUserStore::new()),
        )
    }
}

/// Build the state for the configured storage backend.
/// Runs migrations against PostgreSQL outside production.
pub async fn build_state(config: Config) -> anyhow::Result<AppState> {
    match config.database.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            Ok(AppState::in_memory(config))
        }
        StorageBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(&config.database.url)
                .await?;
            tracing::info!("Database connection established");

            if !config.is_production() {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&db_pool).await?;
                tracing::info!("Migrations completed");
            }

            Ok(AppState::new(
                config,
                Arc::new(PgInventoryStore::new(db_pool.clone())),
                Arc::new(PgUserStore::new(db_pool)),
            ))
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes(state.clone()));

    if !state.config.is_production() {
        app = app.layer(from_fn(error::expose_error_detail));
    }

    app.layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Inventario API v1"
}

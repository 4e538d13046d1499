//! Route definitions for the inventory API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes
        .nest("/auth", auth_routes(state.clone()))
        // Protected routes - inventory management
        .nest("/inventario", inventory_routes(state))
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/register", post(handlers::register))
        .route("/profile", get(handlers::profile))
        .route("/logout", post(handlers::logout))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/login", post(handlers::login))
        .route("/refresh-token", post(handlers::refresh_token))
        .merge(protected)
}

/// Inventory routes (protected)
fn inventory_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route(
            "/:id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route("/:id/entradas", post(handlers::add_entry))
        .route("/:id/salidas", post(handlers::add_exit))
        .route("/:id/auditoria", get(handlers::get_audit_trail))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

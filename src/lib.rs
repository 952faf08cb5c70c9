//! RWU Inc. admin core.
//!
//! Session guard, typed record store client, editable and listed record
//! panels, and toast notifications for the company's content admin portal,
//! plus the SQLite-backed record-store service those panels talk to.

pub mod api;
pub mod auth;
pub mod campaign;
pub mod config;
pub mod context;
pub mod db;
pub mod errors;
pub mod models;
pub mod notify;
pub mod panels;
pub mod session;
pub mod store;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use db::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    // Clone key for the auth layer
    let api_key = state.config.api_key.clone();

    let rest_routes = Router::new()
        .route(
            "/{collection}",
            get(api::list_records)
                .post(api::insert_records)
                .patch(api::update_record)
                .delete(api::delete_record),
        )
        .layer(middleware::from_fn(move |req, next| {
            auth::api_key_layer(api_key.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/rest/v1", rest_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

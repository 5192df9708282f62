//! # smartpos-server: HTTP API
//!
//! ## Module Organization
//!
//! - [`config`] - TOML + environment configuration
//! - [`auth`] - Bearer tokens, user resolution, permission gates
//! - [`retry`] - Bounded backoff polling
//! - [`routes`] - Sale handlers and request bodies
//! - [`error`] - Error to HTTP response mapping

pub mod auth;
pub mod config;
pub mod error;
pub mod retry;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use smartpos_db::{Database, SaleService};

use crate::config::ServerConfig;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub sales: SaleService,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        let sales = db.sales_service(config.sales.clone());
        AppState {
            db,
            sales,
            config: Arc::new(config),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    // Protected routes: require a resolved caller.
    let protected = Router::new()
        .route("/ventas", post(routes::create_sale).get(routes::list_sales))
        .route("/ventas/{id}", get(routes::get_sale))
        .route("/clientes/{id}/credito", get(routes::check_credit))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::health))
        .merge(protected)
        .with_state(state)
}

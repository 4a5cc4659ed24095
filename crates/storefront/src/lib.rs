//! Boutique storefront library.
//!
//! Catalog, cart, checkout, coupons, card payment and refund requests over a
//! relational store. The binary in `main.rs` wires these modules to
//! `PostgreSQL`, Stripe and the session store; tests wire them to the
//! in-memory store and fake gateways.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::services::ServeDir;

use crate::state::AppState;

/// Directory static assets are served from, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// The storefront router with state applied.
///
/// Session, tracing and Sentry layers are added by the caller, so tests can
/// substitute an in-memory session store.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .with_state(state)
}

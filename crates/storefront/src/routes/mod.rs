//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Catalog (?page=N)
//! GET  /product/{slug}                - Item detail
//! GET  /health                        - Liveness probe
//! GET  /health/ready                  - Readiness probe (store ping)
//!
//! # Cart (requires sign-in)
//! GET  /order-summary                 - Active cart
//! POST /add-to-cart/{slug}            - Add one unit
//! POST /remove-from-cart/{slug}       - Remove the line
//! POST /remove-item-from-cart/{slug}  - Remove one unit
//!
//! # Checkout (requires sign-in)
//! GET  /checkout                      - Address and payment option form
//! POST /checkout                      - Resolve addresses
//! POST /add-coupon                    - Apply a coupon code
//! GET  /payment/{option}              - Card form with a fresh payment intent
//! POST /order-confirmed               - Charge and finalize
//!
//! # Refunds (requires sign-in)
//! GET  /request-refund                - Refund form
//! POST /request-refund                - Record a refund request
//! ```
//!
//! Handlers answer failures the customer can act on with a flash message
//! and a redirect; only storage failures become error responses.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod health;
pub mod payment;
pub mod refunds;
pub mod views;

use axum::{
    Router,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware::flash::{self, FlashLevel};
use crate::services::{ErrorKind, ShopError};
use crate::state::AppState;

/// Flash a failure and redirect to `to`, or escalate it when it is not
/// something the customer can fix.
pub(crate) async fn recover(
    session: &Session,
    err: ShopError,
    to: &str,
) -> Result<Response, AppError> {
    // An unknown slug in the URL is a 404, not a message.
    if matches!(err, ShopError::ItemNotFound(_)) || err.kind() == ErrorKind::Internal {
        return Err(err.into());
    }
    let level = match err.kind() {
        ErrorKind::NotFound => FlashLevel::Info,
        ErrorKind::Validation => FlashLevel::Warning,
        ErrorKind::Payment | ErrorKind::Internal => FlashLevel::Error,
    };
    tracing::debug!(error = %err, redirect = to, "Recovering from shop error");
    flash::push(session, level, err.user_message()).await;
    Ok(Redirect::to(to).into_response())
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/order-summary", get(cart::summary))
        .route("/add-to-cart/{slug}", post(cart::add))
        .route("/remove-from-cart/{slug}", post(cart::remove))
        .route("/remove-item-from-cart/{slug}", post(cart::decrement))
}

/// Create the checkout and payment routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", get(checkout::show).post(checkout::submit))
        .route("/add-coupon", post(checkout::add_coupon))
        .route("/payment/{option}", get(payment::show))
        .route("/order-confirmed", post(payment::confirm))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::index))
        .route("/product/{slug}", get(catalog::show))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(cart_routes())
        .merge(checkout_routes())
        .route(
            "/request-refund",
            get(refunds::show).post(refunds::submit),
        )
}

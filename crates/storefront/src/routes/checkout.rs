//! Checkout and coupon route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::recover;
use super::views::{AddressView, OrderView};
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::middleware::flash::{self, FlashLevel, FlashMessage};
use crate::services::{CheckoutForm, CheckoutService, CouponService};
use crate::state::AppState;

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/form.html")]
pub struct CheckoutTemplate {
    pub flashes: Vec<FlashMessage>,
    pub order: OrderView,
    pub default_shipping: Option<AddressView>,
    pub default_billing: Option<AddressView>,
}

/// Coupon form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CouponForm {
    pub code: String,
}

/// Display the checkout form.
#[instrument(skip(state, session, ctx))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireUser(ctx): RequireUser,
) -> Result<Response> {
    let page = match CheckoutService::new(state.store()).prepare(ctx).await {
        Ok(page) => page,
        Err(e) => return recover(&session, e, "/").await,
    };

    Ok(CheckoutTemplate {
        flashes: flash::take(&session).await,
        order: OrderView::new(&page.order, state.config().stripe.currency),
        default_shipping: page.default_shipping.as_ref().map(AddressView::from),
        default_billing: page.default_billing.as_ref().map(AddressView::from),
    }
    .into_response())
}

/// Resolve addresses and continue to payment.
#[instrument(skip(state, session, ctx, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    RequireUser(ctx): RequireUser,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    match CheckoutService::new(state.store()).submit(ctx, &form).await {
        Ok(option) => Ok(Redirect::to(&format!("/payment/{option}")).into_response()),
        Err(e) => recover(&session, e, "/checkout").await,
    }
}

/// Apply a coupon code to the cart.
#[instrument(skip(state, session, ctx))]
pub async fn add_coupon(
    State(state): State<AppState>,
    session: Session,
    RequireUser(ctx): RequireUser,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    match CouponService::new(state.store()).apply(ctx, &form.code).await {
        Ok(_) => {
            flash::push(&session, FlashLevel::Success, "Successfully added coupon").await;
            Ok(Redirect::to("/checkout").into_response())
        }
        Err(e) => recover(&session, e, "/checkout").await,
    }
}

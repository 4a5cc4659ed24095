//! Payment route handlers.
//!
//! `GET /payment/stripe` opens a payment intent and renders the card form.
//! The browser confirms the card with Stripe.js and posts the intent id to
//! `/order-confirmed`, which verifies it server-side before finalizing.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use boutique_core::PaymentOption;

use super::recover;
use super::views::OrderView;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::middleware::flash::{self, FlashLevel, FlashMessage};
use crate::services::{PaymentOrchestrator, ShopError};
use crate::state::AppState;

/// Card payment template.
#[derive(Template, WebTemplate)]
#[template(path = "payment/stripe.html")]
pub struct StripePaymentTemplate {
    pub flashes: Vec<FlashMessage>,
    pub order: OrderView,
    pub amount: String,
    pub client_secret: String,
    pub publishable_key: String,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "payment/confirmed.html")]
pub struct OrderConfirmedTemplate {
    pub flashes: Vec<FlashMessage>,
    pub order: OrderView,
}

/// Posted by the card form once Stripe.js has confirmed the payment.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfirmForm {
    pub payment_intent: String,
}

fn orchestrator(state: &AppState) -> PaymentOrchestrator<'_> {
    PaymentOrchestrator::new(
        state.store(),
        state.gateway(),
        state.config().stripe.currency,
    )
}

/// Display the payment form for the chosen option.
#[instrument(skip(state, session, ctx))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireUser(ctx): RequireUser,
    Path(option): Path<String>,
) -> Result<Response> {
    let option: PaymentOption = option
        .parse()
        .map_err(|_| AppError::NotFound(format!("payment option {option}")))?;
    if option != PaymentOption::Stripe {
        let unavailable = ShopError::Validation("This payment option is not available".to_owned());
        return recover(&session, unavailable, "/checkout").await;
    }

    let page = match orchestrator(&state).begin(ctx).await {
        Ok(page) => page,
        Err(e @ ShopError::MissingBillingAddress) => {
            return recover(&session, e, "/checkout").await;
        }
        Err(e) => return recover(&session, e, "/").await,
    };

    Ok(StripePaymentTemplate {
        flashes: flash::take(&session).await,
        order: OrderView::new(&page.order, page.amount.currency_code),
        amount: page.amount.display(),
        client_secret: page.intent.client_secret,
        publishable_key: state.config().stripe.public_key.clone(),
    }
    .into_response())
}

/// Charge the cart and show the confirmation.
#[instrument(skip(state, session, ctx, form))]
pub async fn confirm(
    State(state): State<AppState>,
    session: Session,
    RequireUser(ctx): RequireUser,
    Form(form): Form<ConfirmForm>,
) -> Result<Response> {
    add_breadcrumb("payment", "confirm", None);

    match orchestrator(&state)
        .charge(ctx, form.payment_intent.trim())
        .await
    {
        Ok(order) => {
            flash::push(&session, FlashLevel::Success, "Your order was successful!").await;
            Ok(OrderConfirmedTemplate {
                flashes: flash::take(&session).await,
                order: OrderView::new(&order, state.config().stripe.currency),
            }
            .into_response())
        }
        Err(e) => recover(&session, e, "/").await,
    }
}

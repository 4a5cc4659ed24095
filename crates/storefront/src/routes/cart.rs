//! Cart route handlers.
//!
//! Mutations are plain form posts that redirect: to the order summary when
//! the cart changed, back to the item otherwise.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use super::recover;
use super::views::OrderView;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::middleware::flash::{self, FlashLevel, FlashMessage};
use crate::services::{CartOutcome, CartService, RequestContext, ShopError};
use crate::state::AppState;

/// Order summary template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/summary.html")]
pub struct OrderSummaryTemplate {
    pub flashes: Vec<FlashMessage>,
    pub order: OrderView,
}

/// Display the active cart.
#[instrument(skip(state, session, ctx))]
pub async fn summary(
    State(state): State<AppState>,
    session: Session,
    RequireUser(ctx): RequireUser,
) -> Result<Response> {
    match CartService::new(state.store()).summary(ctx).await {
        Ok(order) => Ok(OrderSummaryTemplate {
            flashes: flash::take(&session).await,
            order: OrderView::new(&order, state.config().stripe.currency),
        }
        .into_response()),
        Err(ShopError::NoActiveOrder) => {
            flash::push(&session, FlashLevel::Error, "You do not have an active order").await;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Clone, Copy)]
enum CartAction {
    Add,
    Remove,
    Decrement,
}

impl CartAction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Decrement => "decrement",
        }
    }
}

async fn apply(
    state: &AppState,
    session: &Session,
    ctx: RequestContext,
    slug: &str,
    action: CartAction,
) -> Result<Response> {
    add_breadcrumb("cart", action.as_str(), Some(&[("slug", slug)]));

    let cart = CartService::new(state.store());
    let result = match action {
        CartAction::Add => cart.add(ctx, slug).await,
        CartAction::Remove => cart.remove(ctx, slug).await,
        CartAction::Decrement => cart.decrement(ctx, slug).await,
    };

    let product = format!("/product/{slug}");
    let outcome: CartOutcome = match result {
        Ok(outcome) => outcome,
        Err(e) => return recover(session, e, &product).await,
    };

    flash::push(session, FlashLevel::Info, outcome.message()).await;
    let to = if outcome.changed() {
        "/order-summary"
    } else {
        product.as_str()
    };
    Ok(Redirect::to(to).into_response())
}

/// Add one unit of an item.
#[instrument(skip(state, session, ctx))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireUser(ctx): RequireUser,
    Path(slug): Path<String>,
) -> Result<Response> {
    apply(&state, &session, ctx, &slug, CartAction::Add).await
}

/// Remove an item's line.
#[instrument(skip(state, session, ctx))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireUser(ctx): RequireUser,
    Path(slug): Path<String>,
) -> Result<Response> {
    apply(&state, &session, ctx, &slug, CartAction::Remove).await
}

/// Remove one unit of an item.
#[instrument(skip(state, session, ctx))]
pub async fn decrement(
    State(state): State<AppState>,
    session: Session,
    RequireUser(ctx): RequireUser,
    Path(slug): Path<String>,
) -> Result<Response> {
    apply(&state, &session, ctx, &slug, CartAction::Decrement).await
}

//! Refund request route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use super::recover;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::middleware::flash::{self, FlashLevel, FlashMessage};
use crate::services::{RefundForm, RefundService};
use crate::state::AppState;

const REFUND_PATH: &str = "/request-refund";

/// Refund request template.
#[derive(Template, WebTemplate)]
#[template(path = "refunds/form.html")]
pub struct RefundTemplate {
    pub flashes: Vec<FlashMessage>,
}

/// Display the refund form.
#[instrument(skip(session, _user))]
pub async fn show(session: Session, _user: RequireUser) -> RefundTemplate {
    RefundTemplate {
        flashes: flash::take(&session).await,
    }
}

/// Record a refund request.
#[instrument(skip(state, session, _user, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    _user: RequireUser,
    Form(form): Form<RefundForm>,
) -> Result<Response> {
    match RefundService::new(state.store()).request(&form).await {
        Ok(_) => {
            flash::push(&session, FlashLevel::Info, "Your request was received.").await;
            Ok(Redirect::to(REFUND_PATH).into_response())
        }
        Err(e) => recover(&session, e, REFUND_PATH).await,
    }
}

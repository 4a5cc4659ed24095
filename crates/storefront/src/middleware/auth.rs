//! Signed-in user extractor.
//!
//! Sign-in itself belongs to the identity provider, which writes a
//! [`CurrentUser`] into the session. Handlers that act on a cart take
//! [`RequireUser`] and pass the resulting [`RequestContext`] into the
//! services.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::set_sentry_user;
use crate::models::{CurrentUser, session_keys};
use crate::services::RequestContext;

/// Where anonymous visitors are sent.
pub const LOGIN_PATH: &str = "/accounts/login";

/// Extractor that requires a signed-in user.
///
/// ```rust,ignore
/// async fn handler(RequireUser(ctx): RequireUser) -> impl IntoResponse {
///     CartService::new(state.store()).summary(ctx).await
/// }
/// ```
pub struct RequireUser(pub RequestContext);

/// Rejection for [`RequireUser`].
pub enum AuthRejection {
    /// No user in the session; send them to sign in.
    RedirectToLogin,
    /// The session layer is missing from the stack.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::MissingSession => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::MissingSession)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection::RedirectToLogin)?;

        set_sentry_user(&user.id);
        tracing::Span::current().record("user_id", user.id.as_i64());

        Ok(Self(RequestContext::new(user.id)))
    }
}

/// Store the signed-in user in the session.
///
/// Used by the identity provider integration and by tests.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

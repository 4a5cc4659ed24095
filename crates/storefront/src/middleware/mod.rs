//! HTTP middleware for the storefront.
//!
//! # Layer order (outermost first)
//!
//! 1. Sentry hub and transaction
//! 2. `TraceLayer` request span
//! 3. Request id
//! 4. Session (tower-sessions with `PostgreSQL` store)
//!
//! [`RequireUser`] and [`flash`] read the session inside handlers.

pub mod auth;
pub mod flash;
pub mod request_id;
pub mod session;

pub use auth::{LOGIN_PATH, RequireUser, set_current_user};
pub use flash::{FlashLevel, FlashMessage};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use session::create_session_layer;

//! Session-related types.

use serde::{Deserialize, Serialize};

use boutique_core::UserId;

/// Session-stored user identity.
///
/// Written by the identity provider when the user signs in; the storefront
/// only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's ID in the identity provider.
    pub id: UserId,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for queued one-shot messages shown on the next page render.
    pub const FLASH_MESSAGES: &str = "flash_messages";
}

//! One-shot messages carried across a redirect.
//!
//! Messages queue in the session and are drained by the next page render.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// Severity of a flash message; maps onto an alert style in the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl FlashLevel {
    /// CSS class suffix.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

/// Queue a message for the next page render.
///
/// Session failures are logged and the message is dropped.
pub async fn push(session: &Session, level: FlashLevel, text: impl Into<String>) {
    let mut messages = peek(session).await;
    messages.push(FlashMessage {
        level,
        text: text.into(),
    });
    if let Err(e) = session.insert(session_keys::FLASH_MESSAGES, messages).await {
        tracing::warn!(error = %e, "Failed to queue flash message");
    }
}

/// Drain all queued messages.
pub async fn take(session: &Session) -> Vec<FlashMessage> {
    match session
        .remove::<Vec<FlashMessage>>(session_keys::FLASH_MESSAGES)
        .await
    {
        Ok(messages) => messages.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash messages");
            Vec::new()
        }
    }
}

async fn peek(session: &Session) -> Vec<FlashMessage> {
    session
        .get::<Vec<FlashMessage>>(session_keys::FLASH_MESSAGES)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_messages_drain_in_order() {
        let session = session();

        push(&session, FlashLevel::Success, "first").await;
        push(&session, FlashLevel::Error, "second").await;

        let messages = take(&session).await;
        assert_eq!(
            messages
                .iter()
                .map(|m| m.text.as_str())
                .collect::<Vec<_>>(),
            ["first", "second"]
        );
        assert_eq!(messages.last().map(|m| m.level), Some(FlashLevel::Error));
        assert!(take(&session).await.is_empty());
    }
}

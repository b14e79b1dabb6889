use async_trait::async_trait;
use thiserror::Error;

use super::events::SessionEvent;

/// Errors that can occur when handling session events
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Handler error: {0}")]
    HandlerError(String),
}

impl EventError {
    pub fn handler(msg: impl Into<String>) -> Self {
        EventError::HandlerError(msg.into())
    }
}

/// Trait for components that react to session changes
///
/// A typical handler resets state derived from the session when a
/// `LoggedOut` event arrives, and reloads it after `LoggedIn`.
#[async_trait]
pub trait SessionEventHandler: Send + Sync {
    async fn handle_session_event(&self, event: &SessionEvent) -> Result<(), EventError>;

    /// Get a human-readable name for this handler (for logging/debugging)
    fn handler_name(&self) -> &'static str;
}

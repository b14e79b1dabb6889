use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// The user asked to log out
    Explicit,
    /// The refresh endpoint refused the refresh token or could not be reached
    RefreshFailed,
    /// An authenticated request came back with 401
    Rejected,
}

impl LogoutReason {
    /// Whether the logout happened without the user asking for it
    pub fn is_forced(&self) -> bool {
        !matches!(self, LogoutReason::Explicit)
    }
}

/// Events describing changes to the session.
///
/// Events are facts: they are emitted after the session has already changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// A login populated the session
    LoggedIn { expires_at: DateTime<Utc> },

    /// A silent refresh replaced the access token
    Refreshed { expires_at: DateTime<Utc> },

    /// The session was cleared
    LoggedOut { reason: LogoutReason },
}

impl SessionEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::LoggedIn { .. } => "logged_in",
            SessionEvent::Refreshed { .. } => "refreshed",
            SessionEvent::LoggedOut { .. } => "logged_out",
        }
    }

    /// True for `LoggedOut` events the user did not initiate
    pub fn is_forced_logout(&self) -> bool {
        matches!(self, SessionEvent::LoggedOut { reason } if reason.is_forced())
    }
}

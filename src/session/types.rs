use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The two states of the session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

/// Token-free view of the session, safe to log and hand to UI code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub has_access_token: bool,
    pub has_refresh_token: bool,
    pub expiry: Option<DateTime<Utc>>,
    pub epoch: u64,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    pub fn expiry_millis(&self) -> Option<i64> {
        self.expiry.map(|e| e.timestamp_millis())
    }
}

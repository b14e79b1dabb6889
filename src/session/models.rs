use chrono::{DateTime, Duration, Utc};
use std::fmt;
use zeroize::Zeroizing;

use super::types::{SessionSnapshot, SessionState};

/// The client's authentication state.
///
/// Tokens are opaque. `expiry` is the client's own estimate of when the access
/// token stops working; it is never read out of the token.
///
/// Access token, refresh token and expiry are set and cleared together. Only a
/// refresh replaces the access token and expiry on their own.
#[derive(Clone, Default)]
pub struct Session {
    access_token: Option<Zeroizing<String>>,
    refresh_token: Option<Zeroizing<String>>,
    expiry: Option<DateTime<Utc>>,
    /// Bumped on every populate and every effective clear
    epoch: u64,
}

impl Session {
    /// Creates an empty (anonymous) session
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a fresh token pair from a login. Returns the new epoch.
    pub fn populate(
        &mut self,
        access_token: String,
        refresh_token: String,
        expiry: DateTime<Utc>,
    ) -> u64 {
        self.access_token = Some(Zeroizing::new(access_token));
        self.refresh_token = Some(Zeroizing::new(refresh_token));
        self.expiry = Some(expiry);
        self.epoch += 1;
        self.epoch
    }

    /// Replaces the access token and expiry after a successful refresh.
    /// The refresh token and epoch are unchanged.
    pub fn apply_refresh(&mut self, access_token: String, expiry: DateTime<Utc>) {
        self.access_token = Some(Zeroizing::new(access_token));
        self.expiry = Some(expiry);
    }

    /// Drops all credentials. Returns false if the session was already empty.
    pub fn clear(&mut self) -> bool {
        if self.access_token.is_none() && self.refresh_token.is_none() && self.expiry.is_none() {
            return false;
        }
        self.access_token = None;
        self.refresh_token = None;
        self.expiry = None;
        self.epoch += 1;
        true
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn state(&self) -> SessionState {
        if self.is_authenticated() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    /// Whether an access token is held whose expiry is within `skew` of `now`
    /// (or already past). A held token with no expiry counts as stale.
    pub fn needs_refresh(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        if !self.is_authenticated() {
            return false;
        }
        match self.expiry {
            Some(expiry) => expiry - now <= skew,
            None => true,
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_ref().map(|t| t.as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|t| t.as_str())
    }

    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry
    }

    /// Expiry as milliseconds since the Unix epoch
    pub fn expiry_millis(&self) -> Option<i64> {
        self.expiry.map(|e| e.timestamp_millis())
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state(),
            has_access_token: self.access_token.is_some(),
            has_refresh_token: self.refresh_token.is_some(),
            expiry: self.expiry,
            epoch: self.epoch,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |t: &Option<Zeroizing<String>>| t.as_ref().map(|_| "<redacted>");
        f.debug_struct("Session")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("expiry", &self.expiry)
            .field("epoch", &self.epoch)
            .finish()
    }
}

use chrono::Duration;
use futures::FutureExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};
use zeroize::Zeroizing;

use super::{
    clock::{Clock, SystemClock},
    models::Session,
    refresh::{RefreshCoordinator, RefreshOutcome},
    store::SessionStore,
    types::SessionSnapshot,
};
use crate::{
    api::{
        endpoints::Endpoint,
        types::{CredentialsRequest, RefreshResponse, TokenPair},
    },
    event::{EventBus, LogoutReason, SessionEvent},
    shared::AppError,
    transport::{ApiRequest, ApiResponse, HttpTransport, RequestOptions},
    validation,
};

/// Lifetimes used to estimate token expiry
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Assumed access token lifetime after a login
    pub login_token_lifetime: Duration,
    /// Assumed access token lifetime after a refresh
    pub refresh_token_lifetime: Duration,
    /// Refresh this long before the estimated expiry
    pub refresh_skew: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_token_lifetime: Duration::minutes(15),
            refresh_token_lifetime: Duration::minutes(14),
            refresh_skew: Duration::seconds(60),
        }
    }
}

/// State shared with in-flight refresh futures
struct SessionCore {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    store: SessionStore,
    event_bus: EventBus,
    base_url: Url,
    refresh_url: Url,
    config: SessionConfig,
}

/// Mediates every request to the API so callers never deal with token freshness.
///
/// There should be one manager per process. Share it by reference or `Arc`;
/// it owns the session and the refresh slot.
pub struct SessionManager {
    core: Arc<SessionCore>,
    refresh: RefreshCoordinator,
}

impl SessionManager {
    pub fn builder(base_url: Url, transport: Arc<dyn HttpTransport>) -> SessionManagerBuilder {
        SessionManagerBuilder::new(base_url, transport)
    }

    /// Issues a request on behalf of the caller.
    ///
    /// Refreshes the access token first when it is about to expire, attaches it
    /// as a bearer credential, and turns a 401 into `AppError::ForcedLogout`
    /// after clearing the session. Requests to the refresh endpoint carry the
    /// refresh token and are exempt from both rules. Every other response,
    /// success or not, is returned as is.
    #[instrument(skip(self, options), fields(method = %options.method))]
    pub async fn request(
        &self,
        target: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, AppError> {
        let url = self.core.resolve(target)?;
        let is_refresh = self.core.is_refresh_url(&url);

        if !is_refresh && self.core.needs_refresh() {
            info!("Access token near expiry, refreshing before request");
            self.refresh_session().await?;
        }

        // The refresh endpoint authenticates with the refresh token.
        let (bearer, epoch) = self.core.store.read(|session| {
            let token = if is_refresh {
                session.refresh_token()
            } else {
                session.access_token()
            };
            (token.map(|t| Zeroizing::new(t.to_string())), session.epoch())
        });

        let request = build_request(url, options, bearer.as_ref().map(|t| t.as_str()))?;
        let response = self.core.transport.send(request).await?;

        if response.status == StatusCode::UNAUTHORIZED && !is_refresh {
            warn!(path = %target, "Request rejected, clearing session");
            self.core.end_session(epoch, LogoutReason::Rejected);
            return Err(AppError::ForcedLogout);
        }

        debug!(status = response.status.as_u16(), "Request completed");
        Ok(response)
    }

    /// Issues a request without credentials, refresh or rejection handling.
    /// Used for the login, registration and password flows.
    #[instrument(skip(self, options), fields(method = %options.method))]
    pub async fn send_unauthenticated(
        &self,
        target: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, AppError> {
        let url = self.core.resolve(target)?;
        let request = build_request(url, options, None)?;
        self.core.transport.send(request).await
    }

    /// Logs in and populates the session.
    ///
    /// On rejection the server's message is returned and the session is left
    /// as it was.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionSnapshot, AppError> {
        validation::validate_credentials_present(email, password)?;

        let options = RequestOptions::new(Endpoint::Login.method())
            .json(&CredentialsRequest { email, password })?;
        let response = self
            .send_unauthenticated(Endpoint::Login.path(), options)
            .await?;

        if !response.is_success() {
            let message = response
                .error_message()
                .unwrap_or_else(|| "Login failed.".to_string());
            warn!(status = response.status.as_u16(), "Login rejected");
            return Err(AppError::rejected(response.status.as_u16(), message));
        }

        let tokens: TokenPair = response.json()?;
        let expires_at = self.core.clock.now() + self.core.config.login_token_lifetime;

        let snapshot = self.core.store.update(|session| {
            session.populate(tokens.access_token, tokens.refresh_token, expires_at);
            session.snapshot()
        });

        info!(expires_at = %expires_at, "Logged in");
        self.core
            .event_bus
            .emit(SessionEvent::LoggedIn { expires_at });

        Ok(snapshot)
    }

    /// Clears the session. Purely local, safe to call repeatedly.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        let cleared = self.core.store.update(Session::clear);
        if cleared {
            info!("Logged out");
            self.core.event_bus.emit(SessionEvent::LoggedOut {
                reason: LogoutReason::Explicit,
            });
        } else {
            debug!("Logout requested with no active session");
        }
    }

    /// Refreshes now, or joins a refresh that is already running
    async fn refresh_session(&self) -> RefreshOutcome {
        let core = Arc::clone(&self.core);
        self.refresh
            .run_or_join(move || core.refresh_tokens().boxed())
            .await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.core.store.snapshot()
    }

    pub fn is_authenticated(&self) -> bool {
        self.core.store.read(Session::is_authenticated)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.core.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.core.event_bus
    }

    pub fn base_url(&self) -> &Url {
        &self.core.base_url
    }

    pub fn refresh_in_flight(&self) -> bool {
        self.refresh.in_flight()
    }
}

impl SessionCore {
    /// Resolves `target` against the base URL, keeping any base path prefix.
    /// Absolute URLs are used as given.
    fn resolve(&self, target: &str) -> Result<Url, AppError> {
        if let Ok(url) = Url::parse(target) {
            return Ok(url);
        }
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            target.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| AppError::Config(format!("Invalid request URL {}: {}", target, e)))
    }

    fn is_refresh_url(&self, url: &Url) -> bool {
        url.origin() == self.refresh_url.origin() && url.path() == self.refresh_url.path()
    }

    fn needs_refresh(&self) -> bool {
        let now = self.clock.now();
        self.store
            .read(|session| session.needs_refresh(now, self.config.refresh_skew))
    }

    /// Clears the session if it is still at `epoch` and announces it.
    /// Returns false when a newer session has taken its place.
    fn end_session(&self, epoch: u64, reason: LogoutReason) -> bool {
        let is_current = self.store.read(|session| session.epoch() == epoch);
        if !is_current {
            return false;
        }
        if self.store.clear_if_current(epoch) {
            info!(reason = ?reason, "Session cleared");
            self.event_bus.emit(SessionEvent::LoggedOut { reason });
        }
        true
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// Any failure ends the session and yields `ForcedLogout`. If the session
    /// was replaced (new login or logout) while the refresh ran, the result is
    /// discarded and the caller proceeds with whatever session is current.
    async fn refresh_tokens(self: Arc<Self>) -> RefreshOutcome {
        let now = self.clock.now();
        let (refresh_token, epoch, still_needed) = self.store.read(|session| {
            (
                session.refresh_token().map(|t| Zeroizing::new(t.to_string())),
                session.epoch(),
                session.needs_refresh(now, self.config.refresh_skew),
            )
        });

        if !still_needed {
            debug!("Session no longer needs a refresh");
            return Ok(());
        }

        let Some(refresh_token) = refresh_token else {
            warn!("No refresh token held, ending session");
            return self.fail_refresh(epoch);
        };

        let request = build_request(
            self.refresh_url.clone(),
            RequestOptions::new(Endpoint::Refresh.method()),
            Some(refresh_token.as_str()),
        )?;

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Token refresh could not reach the API");
                return self.fail_refresh(epoch);
            }
        };

        if !response.is_success() {
            warn!(status = response.status.as_u16(), "Token refresh rejected");
            return self.fail_refresh(epoch);
        }

        let body: RefreshResponse = match response.json() {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Token refresh returned an unreadable body");
                return self.fail_refresh(epoch);
            }
        };

        let expires_at = self.clock.now() + self.config.refresh_token_lifetime;
        let applied = self.store.update(|session| {
            if session.epoch() != epoch {
                return false;
            }
            session.apply_refresh(body.access_token, expires_at);
            true
        });

        if applied {
            info!(expires_at = %expires_at, "Access token refreshed");
            self.event_bus.emit(SessionEvent::Refreshed { expires_at });
        } else {
            debug!("Session replaced during refresh, discarding refreshed token");
        }

        Ok(())
    }

    fn fail_refresh(&self, epoch: u64) -> RefreshOutcome {
        if self.end_session(epoch, LogoutReason::RefreshFailed) {
            Err(AppError::ForcedLogout)
        } else {
            Ok(())
        }
    }
}

/// Builds the outgoing request: caller headers, then a JSON content type that
/// callers cannot override, then the bearer credential if one is given.
fn build_request(
    url: Url,
    options: RequestOptions,
    bearer: Option<&str>,
) -> Result<ApiRequest, AppError> {
    let mut headers: HeaderMap = options.headers;
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(token) = bearer {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AppError::InvalidResponse("Token is not a valid header value".to_string()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(ApiRequest {
        method: options.method,
        url,
        headers,
        body: options.body,
    })
}

/// Builder for `SessionManager`, defaulting to the system clock, a fresh
/// event bus and the standard token lifetimes
pub struct SessionManagerBuilder {
    base_url: Url,
    transport: Arc<dyn HttpTransport>,
    clock: Option<Arc<dyn Clock>>,
    event_bus: Option<EventBus>,
    config: SessionConfig,
}

impl SessionManagerBuilder {
    pub fn new(base_url: Url, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            base_url,
            transport,
            clock: None,
            event_bus: None,
            config: SessionConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<SessionManager, AppError> {
        let refresh_url = {
            let base = self.base_url.as_str().trim_end_matches('/');
            let joined = format!("{}{}", base, Endpoint::Refresh.path());
            Url::parse(&joined)
                .map_err(|e| AppError::Config(format!("Invalid refresh URL {}: {}", joined, e)))?
        };

        let core = SessionCore {
            transport: self.transport,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock::new())),
            store: SessionStore::new(),
            event_bus: self.event_bus.unwrap_or_default(),
            base_url: self.base_url,
            refresh_url,
            config: self.config,
        };

        Ok(SessionManager {
            core: Arc::new(core),
            refresh: RefreshCoordinator::new(),
        })
    }
}

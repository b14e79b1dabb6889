use async_trait::async_trait;
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use crate::{
    api::{InsightClient, PreviewRow},
    event::{EventError, SessionEvent, SessionEventHandler, SessionSubscription},
    shared::AppError,
};

/// What the dashboard currently shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub preview: Vec<PreviewRow>,
    pub has_access: bool,
}

/// Preview rows and access flag, kept in step with the session
pub struct Dashboard {
    client: InsightClient,
    state: RwLock<DashboardState>,
}

impl Dashboard {
    pub fn new(client: InsightClient) -> Self {
        Self {
            client,
            state: RwLock::new(DashboardState::default()),
        }
    }

    pub async fn state(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    pub async fn has_access(&self) -> bool {
        self.state.read().await.has_access
    }

    /// Fetches preview data and access status
    #[instrument(skip(self))]
    pub async fn reload(&self) -> Result<DashboardState, AppError> {
        let preview = self.client.preview_data().await?;
        let has_access = match self.client.verify_access().await {
            Ok(has_access) => has_access,
            // The session is gone; the LoggedOut event will trigger another reload.
            Err(AppError::ForcedLogout) => false,
            Err(e) => return Err(e),
        };

        let mut state = self.state.write().await;
        state.preview = preview;
        state.has_access = has_access;
        info!(rows = state.preview.len(), has_access, "Dashboard reloaded");
        Ok(state.clone())
    }

    /// Drops everything that depended on the old session
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.has_access = false;
        debug!("Dashboard access reset");
    }

    /// Reloads the dashboard on every login and logout from now on.
    ///
    /// The task only holds a weak reference, so it ends once the dashboard
    /// and every other owner of the session manager are dropped.
    pub fn watch(self: &Arc<Self>) -> JoinHandle<()> {
        let event_bus = self.client.session().event_bus().clone();
        let watcher = DashboardWatcher {
            dashboard: Arc::downgrade(self),
        };
        SessionSubscription::new(Arc::new(watcher), event_bus).start()
    }
}

/// Forwards events to a dashboard that may already be gone
struct DashboardWatcher {
    dashboard: Weak<Dashboard>,
}

#[async_trait]
impl SessionEventHandler for DashboardWatcher {
    async fn handle_session_event(&self, event: &SessionEvent) -> Result<(), EventError> {
        match self.dashboard.upgrade() {
            Some(dashboard) => dashboard.handle_session_event(event).await,
            None => Ok(()),
        }
    }

    fn handler_name(&self) -> &'static str {
        "Dashboard"
    }
}

#[async_trait]
impl SessionEventHandler for Dashboard {
    async fn handle_session_event(&self, event: &SessionEvent) -> Result<(), EventError> {
        match event {
            SessionEvent::LoggedIn { .. } => {}
            SessionEvent::LoggedOut { reason } => {
                info!(reason = ?reason, "Session ended, resetting dashboard");
                self.reset().await;
            }
            SessionEvent::Refreshed { .. } => return Ok(()),
        }

        self.reload()
            .await
            .map(|_| ())
            .map_err(|e| EventError::handler(e.to_string()))
    }

    fn handler_name(&self) -> &'static str {
        "Dashboard"
    }
}

use chrono::{TimeZone, Utc};
use reqwest::Url;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use insight_client::{
    session::ManualClock, Dashboard, InsightClient, SessionEvent, SessionManager,
};

use super::mocks::FakeInsightApi;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub const EMAIL: &str = "a@x.com";
pub const PASSWORD: &str = "pw";

pub struct TestSetup {
    pub api: Arc<FakeInsightApi>,
    pub clock: Arc<ManualClock>,
    pub client: InsightClient,
    pub dashboard: Arc<Dashboard>,
    pub events: broadcast::Receiver<SessionEvent>,
    pub _subscription_handle: Option<JoinHandle<()>>,
}

impl TestSetup {
    pub fn session(&self) -> &Arc<SessionManager> {
        self.client.session()
    }

    pub fn advance_secs(&self, secs: i64) {
        self.clock.advance(chrono::Duration::seconds(secs));
    }

    /// Every event emitted so far, without waiting
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

pub struct TestSetupBuilder {
    base_url: String,
    users: Vec<(String, String)>,
    paid: Vec<String>,
    watch_dashboard: bool,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            users: vec![],
            paid: vec![],
            watch_dashboard: false,
        }
    }

    pub fn with_user(mut self, email: &str, password: &str) -> Self {
        self.users.push((email.to_string(), password.to_string()));
        self
    }

    /// The default user, already holding lifetime access
    pub fn with_paid_user(mut self) -> Self {
        self.users.push((EMAIL.to_string(), PASSWORD.to_string()));
        self.paid.push(EMAIL.to_string());
        self
    }

    pub fn with_default_user(self) -> Self {
        self.with_user(EMAIL, PASSWORD)
    }

    /// Subscribes the dashboard to session events
    pub fn watching_dashboard(mut self) -> Self {
        self.watch_dashboard = true;
        self
    }

    pub fn build(self) -> TestSetup {
        let api = Arc::new(FakeInsightApi::new());
        for (email, password) in &self.users {
            api.add_user(email, password);
        }
        for email in &self.paid {
            api.grant_access(email);
        }

        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));

        let session = SessionManager::builder(Url::parse(&self.base_url).unwrap(), api.clone())
            .with_clock(clock.clone())
            .build()
            .unwrap();
        let events = session.subscribe();
        let client = InsightClient::new(Arc::new(session));
        let dashboard = Arc::new(Dashboard::new(client.clone()));

        let subscription_handle = self.watch_dashboard.then(|| dashboard.watch());

        TestSetup {
            api,
            clock,
            client,
            dashboard,
            events,
            _subscription_handle: subscription_handle,
        }
    }
}

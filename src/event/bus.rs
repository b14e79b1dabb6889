use tokio::sync::broadcast;
use tracing::debug;

use super::events::SessionEvent;

/// Default number of buffered events per subscriber
const DEFAULT_CAPACITY: usize = 64;

/// Event bus for distributing session events to interested parties
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emits an event to all current subscribers. Having none is not an error.
    pub fn emit(&self, event: SessionEvent) {
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(receiver_count) => {
                debug!(
                    event_type = event_type,
                    receivers = receiver_count,
                    "Session event emitted"
                );
            }
            Err(_) => {
                debug!(event_type = event_type, "Session event emitted with no receivers");
            }
        }
    }

    /// Subscribe to all events emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{bus::EventBus, handler::SessionEventHandler};

/// Routes session events from the bus to a single handler
pub struct SessionSubscription {
    handler: Arc<dyn SessionEventHandler>,
    event_bus: EventBus,
}

impl SessionSubscription {
    pub fn new(handler: Arc<dyn SessionEventHandler>, event_bus: EventBus) -> Self {
        Self { handler, event_bus }
    }

    /// Spawns a background task that forwards events to the handler until the
    /// bus is dropped.
    ///
    /// The receiver is created before this returns, so events emitted after
    /// `start` completes are never missed.
    pub fn start(self) -> JoinHandle<()> {
        let handler_name = self.handler.handler_name();
        info!(handler = handler_name, "Starting session subscription");

        let mut receiver = self.event_bus.subscribe();
        let handler = self.handler;
        // The task must not keep the bus alive, or it would never end.
        drop(self.event_bus);

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        info!(
                            handler = handler_name,
                            event_type = event.event_type(),
                            "Received session event"
                        );

                        if let Err(e) = handler.handle_session_event(&event).await {
                            warn!(
                                handler = handler_name,
                                error = %e,
                                "Session event handler failed"
                            );
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            handler = handler_name,
                            skipped = skipped,
                            "Session subscription lagged, events dropped"
                        );
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            info!(handler = handler_name, "Session subscription ended");
        })
    }
}

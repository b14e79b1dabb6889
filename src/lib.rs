// Client library for the Insight API
// This file exposes the public API for the binary and integration tests

pub mod api;
pub mod config;
pub mod dashboard;
pub mod event;
pub mod session;
pub mod shared;
pub mod transport;
pub mod validation;

// Re-export commonly used types for easier access in tests
pub use api::{InsightClient, PaymentConfirmer, PaymentStatus, PreviewRow};
pub use config::ClientConfig;
pub use dashboard::{Dashboard, DashboardState};
pub use event::{EventBus, LogoutReason, SessionEvent, SessionEventHandler, SessionSubscription};
pub use session::{SessionConfig, SessionManager, SessionSnapshot, SessionState};
pub use shared::AppError;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport, RequestOptions};

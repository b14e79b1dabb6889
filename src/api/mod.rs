// Typed access to the Insight API
pub use client::InsightClient;
pub use endpoints::Endpoint;
pub use payment::{PaymentConfirmer, PaymentStatus};
pub use types::{AccessStatus, MessageResponse, PaymentPreparation, PreviewRow};

mod client;
pub mod endpoints;
mod payment;
pub mod types;

// HTTP transport seam
//
// The session manager only ever talks to the network through
// `HttpTransport`, so tests can substitute a scripted transport.

pub use http_client::ReqwestTransport;
pub use types::{ApiRequest, ApiResponse, RequestOptions};

mod http_client;
mod types;

use async_trait::async_trait;

use crate::shared::AppError;

/// Sends a fully prepared request and returns whatever the server answered.
///
/// Non-success statuses are not errors at this layer; only failures to get a
/// response at all are reported as `AppError::Transport`.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AppError>;
}

#[cfg(test)]
pub mod test_utils;

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::{ApiRequest, ApiResponse, HttpTransport};
use crate::shared::AppError;

/// `HttpTransport` backed by a `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, AppError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AppError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.json(&body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "HTTP request failed before a response arrived");
            AppError::Transport(e.to_string())
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            warn!(error = %e, status = status.as_u16(), "Failed to read response body");
            AppError::Transport(e.to_string())
        })?;

        debug!(status = status.as_u16(), body_len = body.len(), "HTTP response received");

        Ok(ApiResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

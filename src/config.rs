use reqwest::Url;
use std::time::Duration;
use tracing::debug;

use crate::shared::AppError;

/// API host used when `API_URL` is not set
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Client configuration for reaching the API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    /// Per-request timeout. `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: None,
        })
    }

    /// Reads `API_URL` and `API_TIMEOUT_SECS` from the environment
    pub fn from_env() -> Result<Self, AppError> {
        let base_url = std::env::var("API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let timeout = match std::env::var("API_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw
                    .parse()
                    .map_err(|_| AppError::Config(format!("Invalid API_TIMEOUT_SECS: {}", raw)))?;
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        debug!(base_url = %base_url, timeout = ?timeout, "Loaded client configuration");

        Ok(Self {
            base_url: parse_base_url(&base_url)?,
            timeout,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

fn parse_base_url(raw: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw).map_err(|e| AppError::Config(format!("Invalid API_URL {}: {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(AppError::Config(format!("API_URL cannot be a base URL: {}", raw)));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_local_development() {
        let config = ClientConfig::new(DEFAULT_API_URL).unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:5000/");
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_new_rejects_garbage() {
        let result = ClientConfig::new("not a url");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_new_rejects_non_base_url() {
        let result = ClientConfig::new("mailto:someone@example.com");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_with_timeout() {
        let config = ClientConfig::new("https://api.example.com")
            .unwrap()
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }
}

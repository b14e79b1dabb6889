use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use super::{ApiRequest, ApiResponse, HttpTransport};
use crate::shared::AppError;

#[derive(Clone)]
enum Reply {
    Respond(ApiResponse),
    Fail(String),
}

/// Scripted transport keyed by URL path, recording every request it sees
#[derive(Default)]
pub struct MockTransport {
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    sticky: Mutex<HashMap<String, Reply>>,
    delays: Mutex<HashMap<String, Duration>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a one-shot reply for `path`
    pub fn reply(&self, path: &str, status: u16, body: Value) -> &Self {
        self.queued
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(Reply::Respond(json_response(status, &body)));
        self
    }

    /// Reply used for `path` whenever nothing is queued
    pub fn reply_always(&self, path: &str, status: u16, body: Value) -> &Self {
        self.sticky
            .lock()
            .unwrap()
            .insert(path.to_string(), Reply::Respond(json_response(status, &body)));
        self
    }

    /// Queues a transport failure for `path`
    pub fn fail(&self, path: &str, message: &str) -> &Self {
        self.queued
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(Reply::Fail(message.to_string()));
        self
    }

    pub fn delay(&self, path: &str, by: Duration) -> &Self {
        self.delays.lock().unwrap().insert(path.to_string(), by);
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Paths of all requests, in the order they were issued
    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.paths().iter().filter(|p| *p == path).count()
    }

    pub fn last_request(&self, path: &str) -> Option<ApiRequest> {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.url.path() == path)
    }
}

fn json_response(status: u16, body: &Value) -> ApiResponse {
    let status = StatusCode::from_u16(status).unwrap();
    ApiResponse::json_body(status, body)
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AppError> {
        let path = request.url.path().to_string();
        self.requests.lock().unwrap().push(request);

        let delay = self.delays.lock().unwrap().get(&path).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&path)
            .and_then(VecDeque::pop_front);
        let reply = queued.or_else(|| self.sticky.lock().unwrap().get(&path).cloned());

        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(AppError::Transport(message)),
            None => Ok(ApiResponse::json_body(
                StatusCode::NOT_FOUND,
                &serde_json::json!({"message": "no mock reply"}),
            )),
        }
    }
}

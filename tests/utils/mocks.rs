use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use insight_client::{transport::HttpTransport, ApiRequest, ApiResponse, AppError};

// ============================================================================
// Fake Insight API
// ============================================================================

/// A request as the fake API saw it
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct ApiState {
    users: HashMap<String, String>,
    paid: HashSet<String>,
    access_tokens: HashMap<String, String>,
    refresh_tokens: HashMap<String, String>,
    refresh_down: bool,
    calls: Vec<RecordedCall>,
}

/// In-process stand-in for the Insight API.
///
/// Issues real-looking tokens, honours them until revoked, and records every
/// call so tests can assert on ordering.
pub struct FakeInsightApi {
    state: Mutex<ApiState>,
    preview: Value,
}

impl FakeInsightApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ApiState::default()),
            preview: json!([
                {"month": "Jan", "revenue": 1200, "region": "north"},
                {"month": "Feb", "revenue": 1350, "region": "south"},
            ]),
        }
    }

    pub fn add_user(&self, email: &str, password: &str) {
        let mut state = self.state.lock().unwrap();
        state.users.insert(email.to_string(), password.to_string());
    }

    pub fn grant_access(&self, email: &str) {
        self.state.lock().unwrap().paid.insert(email.to_string());
    }

    /// Invalidates every issued access token, as if they had expired server-side
    pub fn expire_access_tokens(&self) {
        self.state.lock().unwrap().access_tokens.clear();
    }

    pub fn revoke_refresh_tokens(&self) {
        self.state.lock().unwrap().refresh_tokens.clear();
    }

    /// Makes the refresh endpoint answer 503
    pub fn take_refresh_down(&self) {
        self.state.lock().unwrap().refresh_down = true;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.calls().iter().filter(|c| c.path == path).count()
    }

    pub fn preview_rows(&self) -> usize {
        self.preview.as_array().map(Vec::len).unwrap_or(0)
    }

    fn handle(&self, state: &mut ApiState, call: &RecordedCall) -> (StatusCode, Value) {
        let field = |name: &str| {
            call.body
                .as_ref()
                .and_then(|b| b.get(name))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        match call.path.as_str() {
            "/api/login" => {
                let email = field("email");
                if state.users.get(&email) != Some(&field("password")) {
                    return (
                        StatusCode::UNAUTHORIZED,
                        json!({"message": "Invalid credentials"}),
                    );
                }
                let access = uuid::Uuid::new_v4().to_string();
                let refresh = uuid::Uuid::new_v4().to_string();
                state.access_tokens.insert(access.clone(), email.clone());
                state.refresh_tokens.insert(refresh.clone(), email);
                (
                    StatusCode::OK,
                    json!({"access_token": access, "refresh_token": refresh}),
                )
            }
            "/api/refresh" => {
                if state.refresh_down {
                    return (
                        StatusCode::SERVICE_UNAVAILABLE,
                        json!({"message": "Try later"}),
                    );
                }
                let owner = call
                    .bearer
                    .as_ref()
                    .and_then(|token| state.refresh_tokens.get(token))
                    .cloned();
                match owner {
                    Some(email) => {
                        let access = uuid::Uuid::new_v4().to_string();
                        state.access_tokens.insert(access.clone(), email);
                        (StatusCode::OK, json!({"access_token": access}))
                    }
                    None => (
                        StatusCode::UNAUTHORIZED,
                        json!({"message": "Invalid refresh token"}),
                    ),
                }
            }
            "/api/register" | "/api/prepare-payment" => {
                let email = field("email");
                if state.users.contains_key(&email) && call.path == "/api/register" {
                    return (
                        StatusCode::CONFLICT,
                        json!({"message": "Email already registered"}),
                    );
                }
                state.users.insert(email.clone(), field("password"));
                if call.path == "/api/register" {
                    (StatusCode::CREATED, json!({"message": "Registered"}))
                } else {
                    state.paid.insert(email);
                    (StatusCode::OK, json!({"clientSecret": "pi_test_secret"}))
                }
            }
            "/api/forgot-password" => (
                StatusCode::OK,
                json!({"message": "If that account exists, a reset link has been sent."}),
            ),
            "/api/reset-password" => {
                if field("token") == "expired" {
                    (
                        StatusCode::BAD_REQUEST,
                        json!({"message": "Reset link has expired"}),
                    )
                } else {
                    (StatusCode::OK, json!({"message": "Password updated"}))
                }
            }
            "/api/preview-data" => (StatusCode::OK, self.preview.clone()),
            "/api/verify-access" => {
                let owner = call
                    .bearer
                    .as_ref()
                    .and_then(|token| state.access_tokens.get(token))
                    .cloned();
                match owner {
                    Some(email) => (
                        StatusCode::OK,
                        json!({"hasAccess": state.paid.contains(&email)}),
                    ),
                    None => (StatusCode::UNAUTHORIZED, json!({"error": "Token expired"})),
                }
            }
            _ => (StatusCode::NOT_FOUND, json!({"message": "Not found"})),
        }
    }
}

#[async_trait]
impl HttpTransport for FakeInsightApi {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, AppError> {
        let call = RecordedCall {
            bearer: request.bearer_token().map(str::to_string),
            method: request.method.clone(),
            path: request.url.path().to_string(),
            body: request.body.clone(),
        };

        let mut state = self.state.lock().unwrap();
        let (status, body) = self.handle(&mut state, &call);
        state.calls.push(call);

        Ok(ApiResponse::json_body(status, &body))
    }
}

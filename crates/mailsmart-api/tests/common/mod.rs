#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt;

use mailsmart_api::auth::{self, AppState, AppStateInner};
use mailsmart_api::classifier::ClassifierClient;
use mailsmart_db::Database;
use mailsmart_db::models::NewUser;
use mailsmart_types::models::Role;

pub const JWT_SECRET: &str = "test-secret";
pub const PASSWORD: &str = "password123";

// -- Fake prediction API --

pub struct FakeApiState {
    pub predict_status: StatusCode,
    pub predict_body: Value,
    /// Sent verbatim instead of `predict_body` when set.
    pub predict_raw: Option<String>,
    pub predict_delay: Duration,
    pub feedback_status: StatusCode,
    pub predict_calls: Vec<Value>,
    pub feedback_calls: Vec<Value>,
}

impl Default for FakeApiState {
    fn default() -> Self {
        Self {
            predict_status: StatusCode::OK,
            predict_body: json!({ "is_spam": false, "emotion": "neutral", "spam_score": 0.01 }),
            predict_raw: None,
            predict_delay: Duration::ZERO,
            feedback_status: StatusCode::OK,
            predict_calls: Vec::new(),
            feedback_calls: Vec::new(),
        }
    }
}

type Shared = Arc<Mutex<FakeApiState>>;

/// Stand-in for the prediction API, served by axum on a loopback port.
pub struct FakeApi {
    pub base_url: String,
    state: Shared,
}

impl FakeApi {
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeApiState::default()));
        let app = Router::new()
            .route("/predict", post(predict))
            .route("/feedback", post(feedback))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn respond_predict(&self, status: StatusCode, body: Value) {
        let mut s = self.state.lock().unwrap();
        s.predict_status = status;
        s.predict_body = body;
    }

    /// Answer /predict with a body that is not the expected JSON.
    pub fn respond_predict_raw(&self, status: StatusCode, body: &str) {
        let mut s = self.state.lock().unwrap();
        s.predict_status = status;
        s.predict_raw = Some(body.to_string());
    }

    pub fn delay_predict(&self, delay: Duration) {
        self.state.lock().unwrap().predict_delay = delay;
    }

    pub fn respond_feedback(&self, status: StatusCode) {
        self.state.lock().unwrap().feedback_status = status;
    }

    pub fn predict_calls(&self) -> Vec<Value> {
        self.state.lock().unwrap().predict_calls.clone()
    }

    pub fn feedback_calls(&self) -> Vec<Value> {
        self.state.lock().unwrap().feedback_calls.clone()
    }
}

async fn predict(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let (status, reply, raw, delay) = {
        let mut s = state.lock().unwrap();
        s.predict_calls.push(body);
        (s.predict_status, s.predict_body.clone(), s.predict_raw.clone(), s.predict_delay)
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    match raw {
        Some(text) => (status, [(header::CONTENT_TYPE, "text/html")], text).into_response(),
        None => (status, Json(reply)).into_response(),
    }
}

async fn feedback(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut s = state.lock().unwrap();
    s.feedback_calls.push(body);
    let status = s.feedback_status;
    (status, Json(json!({ "status": "success", "action": "created" })))
}

/// A loopback URL nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

// -- App under test --

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub api: FakeApi,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_api_timeout(Duration::from_secs(5)).await
    }

    /// App whose prediction client gives up after `timeout`.
    pub async fn with_api_timeout(timeout: Duration) -> Self {
        let api = FakeApi::spawn().await;
        let url = api.base_url.clone();
        Self::build(api, &url, timeout)
    }

    /// App whose prediction API cannot be reached at all.
    pub async fn with_dead_api() -> Self {
        let api = FakeApi::spawn().await;
        let url = unreachable_url().await;
        Self::build(api, &url, Duration::from_secs(5))
    }

    fn build(api: FakeApi, classifier_url: &str, timeout: Duration) -> Self {
        let state = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: JWT_SECRET.to_string(),
            session_ttl: chrono::Duration::hours(1),
            classifier: ClassifierClient::new(classifier_url, timeout).unwrap(),
        });
        Self {
            router: mailsmart_api::router(state.clone()),
            state,
            api,
        }
    }

    /// Insert a verified user and mint a session token for them.
    pub fn seed_user(&self, name: &str, email: &str, role: Role) -> (i64, String) {
        self.seed_user_with(name, email, role, true)
    }

    pub fn seed_user_with(&self, name: &str, email: &str, role: Role, verified: bool) -> (i64, String) {
        let hash = auth::hash_password(PASSWORD).unwrap();
        let id = self
            .state
            .db
            .create_user(&NewUser {
                name,
                email,
                password_hash: &hash,
                role: role.as_str(),
                email_verified: verified,
            })
            .unwrap();
        let token =
            auth::create_token(JWT_SECRET, id, role, chrono::Duration::hours(1)).unwrap();
        (id, token)
    }

    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("authorization", format!("Bearer {}", t));
        }
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let body = match body {
            Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, headers, json)
    }
}

pub fn location(headers: &HeaderMap) -> &str {
    headers
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

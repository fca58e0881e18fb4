//! Shared fixtures for unit tests: a recording navigator, a broken token
//! store, and an in-process mock of the REST API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header::AUTHORIZATION};
use serde_json::{Value, json};

use crate::config::ClientConfig;
use crate::error::StorageError;
use crate::net::http::ApiClient;
use crate::session::{AuthFailurePolicy, MemoryTokenStore, Navigator, SessionContext, TokenStore};

const API_PREFIX: &str = "/api";

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.visits.lock().unwrap().push(path.to_owned());
    }
}

/// Token store whose every operation fails.
#[derive(Debug, Default)]
pub struct BrokenTokenStore;

impl TokenStore for BrokenTokenStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Err(broken())
    }

    fn save(&self, _token: &str) -> Result<(), StorageError> {
        Err(broken())
    }

    fn remove(&self) -> Result<(), StorageError> {
        Err(broken())
    }
}

fn broken() -> StorageError {
    StorageError::Io {
        path: "/broken/token".into(),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "storage unavailable"),
    }
}

pub struct TestSession {
    pub store: Arc<MemoryTokenStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub session: Arc<SessionContext>,
}

pub fn test_session(token: Option<&str>) -> TestSession {
    test_session_with_policy(token, AuthFailurePolicy::default())
}

pub fn test_session_with_policy(token: Option<&str>, policy: AuthFailurePolicy) -> TestSession {
    let store = Arc::new(token.map_or_else(MemoryTokenStore::default, MemoryTokenStore::with_token));
    let navigator = Arc::new(RecordingNavigator::default());
    let session = Arc::new(SessionContext::new(store.clone(), navigator.clone(), policy));
    TestSession { store, navigator, session }
}

pub fn user_json(id: u64, roles: &[&str]) -> Value {
    let roles: Vec<Value> = roles.iter().map(|slug| json!({ "slug": slug })).collect();
    json!({ "id": id, "name": format!("User {id}"), "email": format!("user{id}@example.test"), "roles": roles })
}

// =============================================================================
// Mock REST API
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct MockInner {
    routes: HashMap<(String, String), (u16, Value)>,
    requests: Vec<RecordedRequest>,
}

/// Axum server bound to an ephemeral local port that answers from a
/// route table and records every request it sees.
pub struct MockApi {
    pub base_url: String,
    inner: Arc<Mutex<MockInner>>,
}

impl MockApi {
    pub async fn start() -> Self {
        let inner = Arc::new(Mutex::new(MockInner::default()));
        let app = axum::Router::new().fallback(handle).with_state(inner.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { base_url: format!("http://{addr}{API_PREFIX}"), inner }
    }

    /// Answer every `method path` request with `status` and `body`.
    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        self.inner
            .lock()
            .unwrap()
            .routes
            .insert((method.to_owned(), path.to_owned()), (status, body));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::with_base_url(&self.base_url).unwrap()
    }

    pub fn client(&self, session: &Arc<SessionContext>) -> ApiClient {
        ApiClient::new(&self.config(), session.clone()).unwrap()
    }
}

async fn handle(
    State(inner): State<Arc<Mutex<MockInner>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let path = uri.path().strip_prefix(API_PREFIX).unwrap_or(uri.path()).to_owned();
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let mut inner = inner.lock().unwrap();
    inner.requests.push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        query: uri.query().map(str::to_owned),
        authorization,
        body,
    });
    let (status, body) = inner
        .routes
        .get(&(method.to_string(), path))
        .cloned()
        .unwrap_or((404, json!({ "message": "Not found" })));
    (StatusCode::from_u16(status).unwrap(), Json(body))
}

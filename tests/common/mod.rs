// Shared in-process stand-in for the Chi War backend, used by the
// integration tests so nothing depends on a running Rails server.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Redirect},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "password";
pub const TEST_TOKEN: &str = "test-jwt-token-for-chiprobe";
pub const CONFIRMATION_TOKEN: &str = "valid-confirmation-token";

#[derive(Clone)]
pub struct AppState {
    /// Entities created through the fake API, keyed by collection
    /// ("campaigns", "characters", "fights"), newest last
    pub entities: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    /// Total calls to the health route
    pub health_hits: Arc<AtomicU32>,
    /// Health route returns 503 for this many initial calls
    pub health_failures: Arc<AtomicU32>,
}

impl AppState {
    pub fn new(health_failures: u32) -> Self {
        Self {
            entities: Arc::new(Mutex::new(HashMap::new())),
            health_hits: Arc::new(AtomicU32::new(0)),
            health_failures: Arc::new(AtomicU32::new(health_failures)),
        }
    }

    pub fn health_hit_count(&self) -> u32 {
        self.health_hits.load(Ordering::SeqCst)
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/users/sign_in", post(sign_in))
        .route("/users/confirmation", get(confirm))
        .route("/api/v2/users/current", get(current_user))
        .route("/api/v2/:collection", get(list_entities).post(create_entity))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind an ephemeral port and serve the fake backend on a background task.
/// Returns the state handle (for assertions) and the base URL.
pub async fn spawn_backend(health_failures: u32) -> (AppState, String) {
    let state = AppState::new(health_failures);
    let app = router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Test server failed");
    });

    (state, format!("http://{}", addr))
}

async fn sign_in(Json(body): Json<Value>) -> impl IntoResponse {
    let email = body
        .pointer("/user/email")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let password = body
        .pointer("/user/password")
        .and_then(Value::as_str)
        .unwrap_or_default();

    if email == ADMIN_EMAIL && password == ADMIN_PASSWORD {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {}", TEST_TOKEN).parse().unwrap(),
        );
        (
            StatusCode::OK,
            headers,
            Json(json!({ "user": { "email": email } })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            HeaderMap::new(),
            Json(json!({ "error": "Invalid Email or password." })),
        )
    }
}

/// Devise answers a valid confirmation with a redirect to the sign-in page
async fn confirm(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    match params.get("confirmation_token").map(String::as_str) {
        Some(CONFIRMATION_TOKEN) => Redirect::to("/login").into_response(),
        _ => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": { "confirmation_token": ["is invalid"] } })),
        )
            .into_response(),
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TEST_TOKEN))
        .unwrap_or(false)
}

/// Doubles as the health endpoint: 401 without a token still proves the
/// server is up, and the probe treats it as ready. The configured number of
/// initial calls get a 503 so tests can count attempts exactly.
async fn current_user(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    state.health_hits.fetch_add(1, Ordering::SeqCst);

    let remaining = state.health_failures.load(Ordering::SeqCst);
    if remaining > 0 {
        state.health_failures.fetch_sub(1, Ordering::SeqCst);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "starting up" })),
        );
    }

    if authorized(&headers) {
        (
            StatusCode::OK,
            Json(json!({ "email": ADMIN_EMAIL, "admin": true })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "You need to sign in." })),
        )
    }
}

async fn list_entities(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "You need to sign in." })),
        );
    }
    let entities = state.entities.lock().await;
    let items = entities.get(&collection).cloned().unwrap_or_default();

    // Keyed by the collection name, like the real list endpoints
    let mut body = serde_json::Map::new();
    body.insert(collection, Value::Array(items));
    (StatusCode::OK, Json(Value::Object(body)))
}

async fn create_entity(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "You need to sign in." })),
        );
    }

    // Payloads are keyed by the singular noun: { "campaign": { "name": … } }
    let noun = collection.trim_end_matches('s');
    let name = body
        .pointer(&format!("/{}/name", noun))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    if name.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": { "name": ["can't be blank"] } })),
        );
    }

    let mut entities = state.entities.lock().await;
    let items = entities.entry(collection).or_default();
    let entity = json!({ "id": items.len() + 1, "name": name });
    items.push(entity.clone());
    (StatusCode::CREATED, Json(entity))
}

//! Integration tests for Pressmark.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pressmark-integration-tests
//! ```
//!
//! Nothing external is needed. Each test starts a [`FakeBackend`] that
//! speaks enough of the Supabase PostgREST dialect for the storefront, and a
//! [`TestStorefront`] pointed at it, both on ephemeral local ports.
//!
//! # Test Categories
//!
//! - `catalog` - Supabase client against the fake backend
//! - `storefront_routes` - Pages, cart flow and health over HTTP

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::get,
};
use pressmark_storefront::config::StorefrontConfig;
use pressmark_storefront::state::AppState;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::RwLock;

/// API key accepted by the fake backend.
pub const ANON_KEY: &str = "eyJhbGciOiJIUzI1NiJ9.aB3xY9mK2nL5pQ7rT0uW4zC6";

/// Table served by the fake backend.
pub const PRODUCTS_TABLE: &str = "products";

// ============================================================================
// Fake PostgREST Backend
// ============================================================================

#[derive(Clone, Default)]
struct BackendState {
    rows: Arc<RwLock<Vec<Value>>>,
    requests: Arc<AtomicUsize>,
    failure: Arc<RwLock<Option<StatusCode>>>,
}

/// In-process stand-in for `{SUPABASE_URL}/rest/v1/{table}`.
///
/// Supports the filters the storefront sends: `col=eq.X`, `col=neq.X`,
/// `order=created_at.desc` and `limit=N`. Requests without the expected
/// `apikey` and bearer token are rejected with 401.
pub struct FakeBackend {
    addr: SocketAddr,
    state: BackendState,
}

impl FakeBackend {
    /// Start serving `rows`.
    pub async fn start(rows: Vec<Value>) -> Self {
        let state = BackendState {
            rows: Arc::new(RwLock::new(rows)),
            ..BackendState::default()
        };

        let app = Router::new()
            .route("/rest/v1/{table}", get(serve_table))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Fake backend has no address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Fake backend stopped");
        });

        Self { addr, state }
    }

    /// Project URL to use as `SUPABASE_URL`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of table requests served so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Drop the row with `id`.
    pub async fn remove_row(&self, id: &str) {
        self.state
            .rows
            .write()
            .await
            .retain(|row| column_text(row, "id").as_deref() != Some(id));
    }

    /// Set `column` on the row with `id`.
    pub async fn update_row(&self, id: &str, column: &str, value: Value) {
        let mut rows = self.state.rows.write().await;
        for row in rows.iter_mut() {
            if column_text(row, "id").as_deref() == Some(id)
                && let Some(fields) = row.as_object_mut()
            {
                fields.insert(column.to_string(), value.clone());
            }
        }
    }

    /// Answer every request with `status` until cleared with `None`.
    pub async fn fail_with(&self, status: Option<StatusCode>) {
        *self.state.failure.write().await = status;
    }
}

async fn serve_table(
    State(state): State<BackendState>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);

    if table != PRODUCTS_TABLE {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("relation \"{table}\" does not exist") })),
        )
            .into_response();
    }

    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let bearer = format!("Bearer {ANON_KEY}");
    if header("apikey") != Some(ANON_KEY) || header(AUTHORIZATION.as_str()) != Some(bearer.as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid API key" })),
        )
            .into_response();
    }

    if let Some(status) = *state.failure.read().await {
        return (status, Json(json!({ "message": "injected failure" }))).into_response();
    }

    let mut rows: Vec<Value> = state
        .rows
        .read()
        .await
        .iter()
        .filter(|row| params.iter().all(|(key, value)| matches_filter(row, key, value)))
        .cloned()
        .collect();

    if params
        .iter()
        .any(|(key, value)| key == "order" && value == "created_at.desc")
    {
        rows.sort_by(|a, b| column_text(b, "created_at").cmp(&column_text(a, "created_at")));
    }

    if let Some(limit) = params
        .iter()
        .find(|(key, _)| key == "limit")
        .and_then(|(_, value)| value.parse::<usize>().ok())
    {
        rows.truncate(limit);
    }

    Json(rows).into_response()
}

fn matches_filter(row: &Value, key: &str, value: &str) -> bool {
    if matches!(key, "select" | "order" | "limit") {
        return true;
    }
    if let Some(expected) = value.strip_prefix("eq.") {
        return column_text(row, key).as_deref() == Some(expected);
    }
    if let Some(excluded) = value.strip_prefix("neq.") {
        return column_text(row, key).as_deref() != Some(excluded);
    }
    true
}

/// Column value as PostgREST compares it in filters.
fn column_text(row: &Value, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// A products-table row.
#[must_use]
pub fn product_row(id: &str, name: &str, price: f64, category: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{name} from the test catalog"),
        "price": price,
        "image_url": null,
        "category": category,
        "is_active": true,
        "is_featured": false,
        "stock": null,
        "colors": [],
        "sizes": [],
        "created_at": null,
    })
}

/// Set extra columns on a row built with [`product_row`].
#[must_use]
pub fn with_columns(mut row: Value, columns: &[(&str, Value)]) -> Value {
    if let Some(fields) = row.as_object_mut() {
        for (column, value) in columns {
            fields.insert((*column).to_string(), value.clone());
        }
    }
    row
}

// ============================================================================
// Storefront Under Test
// ============================================================================

/// A storefront serving on an ephemeral port, with a cookie-keeping client.
pub struct TestStorefront {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestStorefront {
    /// Start a storefront backed by `backend`, or with no catalog configured.
    pub async fn start(backend: Option<&FakeBackend>) -> Self {
        Self::start_with(backend, &[]).await
    }

    /// Start a storefront with extra environment overrides.
    pub async fn start_with(backend: Option<&FakeBackend>, overrides: &[(&str, &str)]) -> Self {
        let mut vars: HashMap<String, String> = HashMap::new();
        vars.insert("STOREFRONT_BASE_URL".into(), "http://127.0.0.1".into());
        vars.insert(
            "STOREFRONT_STATIC_DIR".into(),
            concat!(env!("CARGO_MANIFEST_DIR"), "/../storefront/static").into(),
        );
        if let Some(backend) = backend {
            vars.insert("SUPABASE_URL".into(), backend.url());
            vars.insert("SUPABASE_ANON_KEY".into(), ANON_KEY.into());
            vars.insert("SUPABASE_TIMEOUT_SECS".into(), "2".into());
        }
        for (key, value) in overrides {
            vars.insert((*key).to_string(), (*value).to_string());
        }

        let config = StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
            .expect("Invalid test configuration");
        let state = AppState::new(config).expect("Failed to build app state");
        let app = pressmark_storefront::app(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind storefront");
        let addr = listener.local_addr().expect("Storefront has no address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Storefront stopped");
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{addr}"),
            client,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET `path`, returning the status and body.
    pub async fn get(&self, path: &str) -> (reqwest::StatusCode, String) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed");
        let status = response.status();
        (status, response.text().await.expect("Failed to read body"))
    }

    /// POST a form to `path`, following the redirect.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> (reqwest::StatusCode, String) {
        let response = self
            .client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST request failed");
        let status = response.status();
        (status, response.text().await.expect("Failed to read body"))
    }

    /// The cart as reported by `/api/cart`.
    pub async fn cart_json(&self) -> Value {
        self.client
            .get(self.url("/api/cart"))
            .send()
            .await
            .expect("GET /api/cart failed")
            .json()
            .await
            .expect("Cart is not JSON")
    }
}

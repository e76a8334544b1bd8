//! Shared utilities for the integration suites.
//!
//! `spawn_backend` starts an in-process stand-in for the hosted backend: the
//! PostgREST table/rpc surface plus the object-storage API, with switches to
//! force policy denials, insert failures and full outages. `spawn_app` boots
//! the real service against it on an ephemeral port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use forms_api::config::{AppConfig, RateWindowConfig};
use forms_api::http::HttpServer;

pub const ADMIN_KEY: &str = "integration-test-admin-key";

/// Programmable state of the mock backend.
pub struct BackendState {
    next_id: AtomicI64,
    pub contacts: Mutex<Vec<Value>>,
    pub careers: Mutex<Vec<Value>>,
    /// Stored objects by key: (content type, bytes).
    pub objects: Mutex<HashMap<String, (String, Vec<u8>)>>,
    /// Answer direct table inserts with a row-level-security denial.
    pub deny_direct_insert: AtomicBool,
    /// Fail table inserts AND the privileged procedure, but not reads or
    /// storage; exercises the orphaned-upload cleanup.
    pub fail_inserts: AtomicBool,
    /// Fail every database call.
    pub fail_db: AtomicBool,
    /// Fail every storage call.
    pub fail_storage: AtomicBool,
    /// Inserts that arrived through the privileged procedure.
    pub rpc_inserts: AtomicU32,
}

impl BackendState {
    fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            contacts: Mutex::new(Vec::new()),
            careers: Mutex::new(Vec::new()),
            objects: Mutex::new(HashMap::new()),
            deny_direct_insert: AtomicBool::new(false),
            fail_inserts: AtomicBool::new(false),
            fail_db: AtomicBool::new(false),
            fail_storage: AtomicBool::new(false),
            rpc_inserts: AtomicU32::new(0),
        }
    }

    fn table(&self, name: &str) -> Option<&Mutex<Vec<Value>>> {
        match name {
            "contact_submissions" => Some(&self.contacts),
            "career_applications" => Some(&self.careers),
            _ => None,
        }
    }

    fn insert(&self, table: &str, mut row: Value) -> Value {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        row["id"] = json!(id);
        if row.get("created_at").is_none() {
            row["created_at"] = json!(Utc::now().to_rfc3339());
        }
        self.table(table)
            .expect("unknown table")
            .lock()
            .unwrap()
            .push(row.clone());
        row
    }
}

fn db_down() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"message": "backend down"})),
    )
        .into_response()
}

fn policy_denied() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({
            "code": "42501",
            "message": "new row violates row-level security policy"
        })),
    )
        .into_response()
}

/// Apply PostgREST-style `eq.` / `gte.` filters to one row.
fn row_matches(row: &Value, filters: &[(String, String)]) -> bool {
    for (column, expr) in filters {
        let cell = row.get(column.as_str()).cloned().unwrap_or(Value::Null);
        let cell_str = match &cell {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if let Some(operand) = expr.strip_prefix("eq.") {
            if cell_str != operand {
                return false;
            }
        } else if let Some(operand) = expr.strip_prefix("gte.") {
            if cell_str.as_str() < operand {
                return false;
            }
        }
    }
    true
}

fn select_rows(rows: &[Value], query: &[(String, String)]) -> Vec<Value> {
    let filters: Vec<(String, String)> = query
        .iter()
        .filter(|(k, v)| {
            !matches!(k.as_str(), "select" | "order" | "limit" | "offset")
                && (v.starts_with("eq.") || v.starts_with("gte."))
        })
        .cloned()
        .collect();
    let mut out: Vec<Value> = rows
        .iter()
        .filter(|row| row_matches(row, &filters))
        .cloned()
        .collect();

    if let Some(order) = query.iter().find(|(k, _)| k == "order").map(|(_, v)| v) {
        let descending = order.ends_with(".desc");
        // Rows arrive in id order and every sortable column here grows with
        // it, so sorting by id is equivalent for the mock.
        out.sort_by_key(|row| row["id"].as_i64().unwrap_or(0));
        if descending {
            out.reverse();
        }
    }

    let offset = query
        .iter()
        .find(|(k, _)| k == "offset")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let limit = query
        .iter()
        .find(|(k, _)| k == "limit")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(usize::MAX);
    out.into_iter().skip(offset).take(limit).collect()
}

async fn rest_get(
    State(state): State<Arc<BackendState>>,
    Path(table): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    if state.fail_db.load(Ordering::SeqCst) {
        return db_down();
    }
    let Some(rows) = state.table(&table) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "unknown table"})),
        )
            .into_response();
    };
    let rows = rows.lock().unwrap().clone();

    let wants_count = headers
        .get("prefer")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("count=exact"));
    if wants_count {
        let total = select_rows(&rows, &query).len();
        return (
            StatusCode::PARTIAL_CONTENT,
            [("content-range", format!("0-0/{total}"))],
            Json(json!([])),
        )
            .into_response();
    }

    Json(Value::Array(select_rows(&rows, &query))).into_response()
}

async fn rest_post(
    State(state): State<Arc<BackendState>>,
    Path(table): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if state.fail_db.load(Ordering::SeqCst) || state.fail_inserts.load(Ordering::SeqCst) {
        return db_down();
    }
    if state.deny_direct_insert.load(Ordering::SeqCst) {
        return policy_denied();
    }
    if state.table(&table).is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "unknown table"})),
        )
            .into_response();
    }
    let row = state.insert(&table, body);
    (StatusCode::CREATED, Json(json!([row]))).into_response()
}

async fn rest_patch(
    State(state): State<Arc<BackendState>>,
    Path(table): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
    Json(body): Json<Value>,
) -> Response {
    if state.fail_db.load(Ordering::SeqCst) {
        return db_down();
    }
    let Some(rows) = state.table(&table) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "unknown table"})),
        )
            .into_response();
    };
    let id = query
        .iter()
        .find(|(k, _)| k == "id")
        .and_then(|(_, v)| v.strip_prefix("eq."))
        .and_then(|v| v.parse::<i64>().ok());

    let mut rows = rows.lock().unwrap();
    let updated = rows
        .iter_mut()
        .find(|row| row["id"].as_i64() == id)
        .map(|row| {
            if let (Some(target), Some(patch)) = (row.as_object_mut(), body.as_object()) {
                for (k, v) in patch {
                    target.insert(k.clone(), v.clone());
                }
            }
            row.clone()
        });

    match updated {
        Some(row) => Json(json!([row])).into_response(),
        None => Json(json!([])).into_response(),
    }
}

async fn rest_rpc(
    State(state): State<Arc<BackendState>>,
    Path(function): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if state.fail_db.load(Ordering::SeqCst) || state.fail_inserts.load(Ordering::SeqCst) {
        return db_down();
    }
    let table = match function.as_str() {
        "insert_contact_submission" => "contact_submissions",
        "insert_career_application" => "career_applications",
        _ => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"message": "unknown function"})),
            )
                .into_response()
        }
    };
    let Some(record) = body.get("record").cloned() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "missing record argument"})),
        )
            .into_response();
    };
    state.rpc_inserts.fetch_add(1, Ordering::SeqCst);
    // RPC answers with a bare object, not a one-element array.
    Json(state.insert(table, record)).into_response()
}

async fn storage_put(
    State(state): State<Arc<BackendState>>,
    Path((_bucket, key)): Path<(String, String)>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Response {
    if state.fail_storage.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "storage down"})),
        )
            .into_response();
    }
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    state
        .objects
        .lock()
        .unwrap()
        .insert(key.clone(), (content_type, bytes.to_vec()));
    Json(json!({"Key": key})).into_response()
}

async fn storage_delete(
    State(state): State<Arc<BackendState>>,
    Path((_bucket, key)): Path<(String, String)>,
) -> Response {
    if state.objects.lock().unwrap().remove(&key).is_some() {
        Json(json!({"message": "deleted"})).into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"message": "not found"}))).into_response()
    }
}

async fn storage_get_public(
    State(state): State<Arc<BackendState>>,
    Path((_bucket, key)): Path<(String, String)>,
) -> Response {
    match state.objects.lock().unwrap().get(&key) {
        Some((content_type, bytes)) => {
            ([("content-type", content_type.clone())], bytes.clone()).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "not found"}))).into_response(),
    }
}

/// Start the mock backend on an ephemeral port.
pub async fn spawn_backend() -> (String, Arc<BackendState>) {
    let state = Arc::new(BackendState::new());
    let router = Router::new()
        .route("/rest/v1/rpc/{function}", post(rest_rpc))
        .route(
            "/rest/v1/{table}",
            get(rest_get).post(rest_post).patch(rest_patch),
        )
        .route(
            "/storage/v1/object/{bucket}/{key}",
            post(storage_put).delete(storage_delete),
        )
        .route(
            "/storage/v1/object/public/{bucket}/{key}",
            get(storage_get_public),
        )
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

/// A running service instance wired to its own mock backend.
pub struct TestApp {
    pub base: String,
    pub backend: Arc<BackendState>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }
}

/// Boot the service against a fresh mock backend, with a config tweak hook
/// for per-test settings (rate ceilings, upload limits, admin key).
pub async fn spawn_app_with<F>(tweak: F) -> TestApp
where
    F: FnOnce(&mut AppConfig),
{
    let (backend_url, backend) = spawn_backend().await;

    let mut config = AppConfig::default();
    config.backend.url = backend_url;
    config.backend.anon_key = "test-anon-key".to_string();
    config.backend.service_role_key = "test-service-key".to_string();
    config.admin.api_key = ADMIN_KEY.to_string();
    config.server.trust_proxy = true;
    // Generous windows by default so unrelated tests never trip the limiter.
    config.contact_rate = RateWindowConfig {
        max_requests: 1000,
        window_secs: 60,
    };
    config.career_rate = RateWindowConfig {
        max_requests: 1000,
        window_secs: 60,
    };
    tweak(&mut config);

    let server = HttpServer::new(config).expect("server setup");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        server.run(listener).await.unwrap();
    });

    TestApp {
        base: format!("http://{addr}"),
        backend,
        client: reqwest::Client::new(),
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// A contact payload that passes every rule.
pub fn valid_contact() -> Value {
    json!({
        "fullName": "John Doe",
        "email": "JOHN@Example.com",
        "contact": "+14155550100",
        "message": "Hello, I have a question about your products."
    })
}

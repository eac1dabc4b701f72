//! In-process fake of the table API
//!
//! Serves `/tables/{collection}` from memory on an ephemeral localhost port:
//! - `POST` assigns `id` and `created_at` and stores the row
//! - `GET` lists with `search=field:value` (all must match), `sort`, `page`, `limit`
//! - `GET /{id}` and `PATCH /{id}` address one row; unknown ids give 404
//!
//! A server built with `failing(status)` answers every request with that status.

use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
}

#[derive(Default)]
struct Tables {
    rows: HashMap<String, Vec<Map<String, Value>>>,
    requests: Vec<RecordedRequest>,
    next_id: u64,
    failure: Option<StatusCode>,
}

#[derive(Clone, Default)]
struct FakeState(Arc<Mutex<Tables>>);

impl FakeState {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct FakeTableServer {
    addr: SocketAddr,
    state: FakeState,
    handle: JoinHandle<()>,
}

impl FakeTableServer {
    pub async fn start() -> std::io::Result<Self> {
        Self::spawn(FakeState::default()).await
    }

    pub async fn failing(status: u16) -> std::io::Result<Self> {
        let state = FakeState::default();
        state.lock().failure =
            Some(StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR));
        Self::spawn(state).await
    }

    async fn spawn(state: FakeState) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = Router::new()
            .route("/tables/:collection", get(list_rows).post(create_row))
            .route("/tables/:collection/:id", get(get_row).patch(patch_row))
            .with_state(state.clone());
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    /// Origin to hand to `TableConfig::new`
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn seed(&self, collection: &str, rows: Vec<Value>) {
        let mut tables = self.state.lock();
        for row in rows {
            if let Value::Object(map) = row {
                tables.rows.entry(collection.to_string()).or_default().push(map);
            }
        }
    }

    pub fn rows(&self, collection: &str) -> Vec<Value> {
        self.state
            .lock()
            .rows
            .get(collection)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }
}

impl Drop for FakeTableServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Record the request; returns the configured failure, if any
fn record(state: &FakeState, method: Method, uri: &Uri) -> Option<Response> {
    let mut tables = state.lock();
    tables.requests.push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
    });
    tables
        .failure
        .map(|status| (status, Json(json!({"error": "unavailable"}))).into_response())
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => value_as_text(a).cmp(&value_as_text(b)),
    }
}

async fn list_rows(
    State(state): State<FakeState>,
    Path(collection): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    method: Method,
    uri: Uri,
) -> Response {
    if let Some(failure) = record(&state, method, &uri) {
        return failure;
    }

    let mut rows = state.lock().rows.get(&collection).cloned().unwrap_or_default();
    let mut page = 1usize;
    let mut limit = 100usize;

    for (key, value) in &params {
        match key.as_str() {
            "search" => {
                if let Some((field, expected)) = value.split_once(':') {
                    rows.retain(|row| {
                        row.get(field)
                            .map(|v| value_as_text(v) == expected)
                            .unwrap_or(false)
                    });
                }
            }
            "page" => page = value.parse().unwrap_or(1).max(1),
            "limit" => limit = value.parse().unwrap_or(100),
            "sort" => {
                let keys: Vec<&str> = value.split(',').collect();
                rows.sort_by(|a, b| {
                    for key in &keys {
                        let (field, descending) = match key.strip_prefix('-') {
                            Some(field) => (field, true),
                            None => (*key, false),
                        };
                        let ord = compare(
                            a.get(field).unwrap_or(&Value::Null),
                            b.get(field).unwrap_or(&Value::Null),
                        );
                        let ord = if descending { ord.reverse() } else { ord };
                        if ord != Ordering::Equal {
                            return ord;
                        }
                    }
                    Ordering::Equal
                });
            }
            _ => {}
        }
    }

    let total = rows.len();
    let data: Vec<Value> = rows
        .into_iter()
        .skip((page - 1) * limit)
        .take(limit)
        .map(Value::Object)
        .collect();

    Json(json!({"data": data, "total": total, "page": page, "limit": limit})).into_response()
}

async fn create_row(
    State(state): State<FakeState>,
    Path(collection): Path<String>,
    method: Method,
    uri: Uri,
    Json(body): Json<Value>,
) -> Response {
    if let Some(failure) = record(&state, method, &uri) {
        return failure;
    }
    let Value::Object(mut row) = body else {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "expected object"}))).into_response();
    };

    let mut tables = state.lock();
    tables.next_id += 1;
    row.insert("id".into(), json!(format!("row-{}", tables.next_id)));
    row.insert(
        "created_at".into(),
        json!(chrono::Utc::now().timestamp_millis()),
    );
    tables.rows.entry(collection).or_default().push(row.clone());

    (StatusCode::CREATED, Json(Value::Object(row))).into_response()
}

async fn get_row(
    State(state): State<FakeState>,
    Path((collection, id)): Path<(String, String)>,
    method: Method,
    uri: Uri,
) -> Response {
    if let Some(failure) = record(&state, method, &uri) {
        return failure;
    }
    let tables = state.lock();
    match tables
        .rows
        .get(&collection)
        .and_then(|rows| rows.iter().find(|r| r.get("id") == Some(&json!(id))))
    {
        Some(row) => Json(Value::Object(row.clone())).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn patch_row(
    State(state): State<FakeState>,
    Path((collection, id)): Path<(String, String)>,
    method: Method,
    uri: Uri,
    Json(patch): Json<Value>,
) -> Response {
    if let Some(failure) = record(&state, method, &uri) {
        return failure;
    }
    let mut tables = state.lock();
    let Some(row) = tables
        .rows
        .get_mut(&collection)
        .and_then(|rows| rows.iter_mut().find(|r| r.get("id") == Some(&json!(id))))
    else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let Value::Object(fields) = patch {
        for (key, value) in fields {
            row.insert(key, value);
        }
    }
    Json(Value::Object(row.clone())).into_response()
}

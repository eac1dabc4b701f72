//! Scripted HTTP endpoints standing in for the submit-form function and the relay

#![allow(dead_code)]

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Router;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Default)]
struct Recorded {
    bodies: Vec<Value>,
}

/// Answers every request with a fixed status and JSON body, recording the
/// request bodies it receives
pub struct MockEndpoint {
    url: String,
    recorded: Arc<Mutex<Recorded>>,
    task: JoinHandle<()>,
}

impl MockEndpoint {
    pub async fn start(status: u16, body: Value) -> Self {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let state = recorded.clone();
        let status = StatusCode::from_u16(status).unwrap();

        let app = Router::new().fallback(move |bytes: Bytes| {
            let state = state.clone();
            let body = body.clone();
            async move {
                let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
                state.lock().unwrap().bodies.push(value);
                (status, axum::Json(body)).into_response()
            }
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            recorded,
            task,
        }
    }

    pub fn url(&self) -> String {
        self.url.clone()
    }

    pub fn hits(&self) -> usize {
        self.recorded.lock().unwrap().bodies.len()
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.recorded.lock().unwrap().bodies.clone()
    }
}

impl Drop for MockEndpoint {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// URL on which nothing listens
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

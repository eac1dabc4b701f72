//! Router tests for `/functions/submit-form` via `tower::ServiceExt::oneshot`

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;
use vivea_core::is_tracking_id;
use vivea_function::{
    create_submit_form_router, FunctionConfig, FunctionState, KvError, KvStore, MemoryKv,
};

/// Email provider stand-in recording bodies and authorization headers
struct MockProvider {
    url: String,
    calls: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    task: tokio::task::JoinHandle<()>,
}

impl MockProvider {
    async fn start(status: u16) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = calls.clone();
        let status = StatusCode::from_u16(status).unwrap();
        let app = Router::new().fallback(move |headers: HeaderMap, body: Bytes| {
            let recorded = recorded.clone();
            async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
                recorded.lock().unwrap().push((auth, value));
                (status, axum::Json(json!({"id": "msg_1"})))
            }
        });
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/send", listener.local_addr().unwrap());
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { url, calls, task }
    }

    fn calls(&self) -> Vec<(Option<String>, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct FailingKv;

#[async_trait]
impl KvStore for FailingKv {
    async fn put(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), KvError> {
        Err(KvError::Http { status: 503 })
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, KvError> {
        Err(KvError::Http { status: 503 })
    }
}

fn bare_app() -> Router {
    create_submit_form_router(FunctionState::new("contact@vivea.ca", "noreply@vivea.ca"))
}

fn app_with(config: FunctionConfig) -> Router {
    create_submit_form_router(FunctionState::from_config(&config).unwrap())
}

fn ana() -> Value {
    json!({"nom": "Ana Smith", "telephone": "514-555-1234", "email": "ana@example.com"})
}

async fn post(app: Router, body: &str, extra: &[(&str, &str)]) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/functions/submit-form")
        .header("content-type", "application/json");
    for (name, value) in extra {
        builder = builder.header(*name, *value);
    }
    let resp = app
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, value)
}

#[tokio::test]
async fn test_empty_name_is_missing_data() {
    let body = json!({"nom": "", "telephone": "514-555-1234", "email": "ana@example.com"});

    let (status, headers, value) = post(bare_app(), &body.to_string(), &[]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["success"], false);
    assert_eq!(value["error"], "Données manquantes");
    assert_eq!(value["message"], "Nom, email et téléphone sont requis");
    assert_eq!(headers["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_bad_email_is_rejected() {
    let body = json!({"nom": "Ana", "telephone": "514-555-1234", "email": "ana@example"});

    let (status, _, value) = post(bare_app(), &body.to_string(), &[]).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["error"], "Email invalide");
}

#[tokio::test]
async fn test_malformed_json_is_a_server_error() {
    let (status, headers, value) = post(bare_app(), "{nom:", &[]).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(value["success"], false);
    assert_eq!(value["error"], "Erreur serveur");
    assert_eq!(
        value["message"],
        "Une erreur technique est survenue. Veuillez réessayer."
    );
    assert_eq!(headers["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_preflight_answers_with_cors_headers() {
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/functions/submit-form")
        .body(Body::empty())
        .unwrap();

    let resp = bare_app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type");
}

#[tokio::test]
async fn test_without_credentials_email_is_not_sent() {
    let (status, headers, value) = post(bare_app(), &ana().to_string(), &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], true);
    assert_eq!(value["emailSent"], false);
    assert_eq!(value["service"], "cloudflare-pages");
    assert_eq!(value["message"], "Votre demande a été envoyée avec succès");
    assert!(is_tracking_id(value["trackingId"].as_str().unwrap()));
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
}

#[tokio::test]
async fn test_well_formed_client_tracking_id_is_kept() {
    let mut body = ana();
    body["trackingId"] = json!("VIV-LOYW3V28-ABCDE");
    let (_, _, value) = post(bare_app(), &body.to_string(), &[]).await;
    assert_eq!(value["trackingId"], "VIV-LOYW3V28-ABCDE");

    body["trackingId"] = json!("not-an-id");
    let (_, _, value) = post(bare_app(), &body.to_string(), &[]).await;
    let generated = value["trackingId"].as_str().unwrap();
    assert_ne!(generated, "not-an-id");
    assert!(is_tracking_id(generated));
}

#[tokio::test]
async fn test_resend_delivery() {
    let resend = MockProvider::start(200).await;
    let app = app_with(FunctionConfig {
        resend_api_key: Some("re_test".into()),
        resend_url: resend.url.clone(),
        ..FunctionConfig::default()
    });

    let (status, _, value) = post(app, &ana().to_string(), &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["emailSent"], true);
    let calls = resend.calls();
    assert_eq!(calls.len(), 1);
    let (auth, sent) = &calls[0];
    assert_eq!(auth.as_deref(), Some("Bearer re_test"));
    assert_eq!(sent["to"], json!(["contact@vivea.ca"]));
    assert_eq!(sent["from"], "noreply@vivea.ca");
    let tracking_id = value["trackingId"].as_str().unwrap();
    assert_eq!(
        sent["subject"],
        format!("Nouvelle demande de test d'eau - {}", tracking_id)
    );
    assert!(sent["html"].as_str().unwrap().contains("Ana Smith"));
    assert!(sent["text"].as_str().unwrap().contains("Téléphone : 514-555-1234"));
}

#[tokio::test]
async fn test_resend_failure_still_answers_200() {
    let resend = MockProvider::start(500).await;
    let app = app_with(FunctionConfig {
        resend_api_key: Some("re_test".into()),
        resend_url: resend.url.clone(),
        ..FunctionConfig::default()
    });

    let (status, _, value) = post(app, &ana().to_string(), &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], true);
    assert_eq!(value["emailSent"], false);
    assert_eq!(resend.calls().len(), 1);
}

#[tokio::test]
async fn test_exactly_one_provider_is_used() {
    let resend = MockProvider::start(200).await;
    let sendgrid = MockProvider::start(202).await;
    let app = app_with(FunctionConfig {
        resend_api_key: Some("re_test".into()),
        resend_url: resend.url.clone(),
        sendgrid_api_key: Some("SG.test".into()),
        sendgrid_url: sendgrid.url.clone(),
        ..FunctionConfig::default()
    });

    post(app, &ana().to_string(), &[]).await;

    assert_eq!(resend.calls().len(), 1);
    assert_eq!(sendgrid.calls().len(), 0);
}

#[tokio::test]
async fn test_sendgrid_delivery() {
    let sendgrid = MockProvider::start(202).await;
    let app = app_with(FunctionConfig {
        contact_email: "ventes@vivea.ca".into(),
        sendgrid_api_key: Some("SG.test".into()),
        sendgrid_url: sendgrid.url.clone(),
        ..FunctionConfig::default()
    });

    let (_, _, value) = post(app, &ana().to_string(), &[]).await;

    assert_eq!(value["emailSent"], true);
    let (auth, sent) = &sendgrid.calls()[0];
    assert_eq!(auth.as_deref(), Some("Bearer SG.test"));
    assert_eq!(sent["personalizations"][0]["to"][0]["email"], "ventes@vivea.ca");
    assert_eq!(sent["content"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_request_snapshot_is_stored_in_kv() {
    let kv = Arc::new(MemoryKv::new());
    let app = create_submit_form_router(
        FunctionState::new("contact@vivea.ca", "noreply@vivea.ca").with_kv_store(kv.clone()),
    );

    let (_, _, value) = post(
        app,
        &ana().to_string(),
        &[("CF-Connecting-IP", "203.0.113.7"), ("CF-IPCountry", "CA")],
    )
    .await;

    let tracking_id = value["trackingId"].as_str().unwrap();
    let raw = kv
        .get(&format!("request:{}", tracking_id))
        .await
        .unwrap()
        .unwrap();
    let snapshot: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(snapshot["id"], tracking_id);
    assert_eq!(snapshot["nom"], "Ana Smith");
    assert_eq!(snapshot["ip"], "203.0.113.7");
    assert_eq!(snapshot["country"], "CA");
}

#[tokio::test]
async fn test_country_defaults_to_unknown() {
    let kv = Arc::new(MemoryKv::new());
    let app = create_submit_form_router(
        FunctionState::new("contact@vivea.ca", "noreply@vivea.ca").with_kv_store(kv.clone()),
    );

    let (_, _, value) = post(app, &ana().to_string(), &[]).await;

    let key = format!("request:{}", value["trackingId"].as_str().unwrap());
    let snapshot: Value = serde_json::from_str(&kv.get(&key).await.unwrap().unwrap()).unwrap();
    assert_eq!(snapshot["country"], "Unknown");
    assert_eq!(snapshot["ip"], Value::Null);
}

#[tokio::test]
async fn test_kv_failure_does_not_fail_the_request() {
    let app = create_submit_form_router(
        FunctionState::new("contact@vivea.ca", "noreply@vivea.ca")
            .with_kv_store(Arc::new(FailingKv)),
    );

    let (status, _, value) = post(app, &ana().to_string(), &[]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["success"], true);
}

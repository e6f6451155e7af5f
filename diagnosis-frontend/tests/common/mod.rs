//! Shared helpers for diagnosis-frontend integration tests.
//!
//! Tests drive the router in-process with `oneshot`; the Gemini tests talk to
//! a local axum server standing in for the remote API.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use diagnosis_frontend::config::{GeminiSettings, ServerSettings};
use diagnosis_frontend::services::agents::DiagnosticAgent;
use diagnosis_frontend::startup::build_router;
use diagnosis_frontend::AppState;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use secrecy::Secret;
use serde_json::Value;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const BOUNDARY: &str = "diagnosis-test-boundary";

pub fn server_settings(max_upload_bytes: usize) -> ServerSettings {
    ServerSettings {
        host: "127.0.0.1".to_string(),
        port: 0,
        static_dir: "static".to_string(),
        max_upload_bytes,
    }
}

pub fn app_with(agent: Arc<dyn DiagnosticAgent>) -> Router {
    build_router(AppState::new(agent, 500), &server_settings(20 * 1024 * 1024))
}

pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 200])
    }));
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

/// POST /analyze the way a browser submits the form. `None` for the image
/// sends an empty file part, as browsers do when nothing was picked.
pub fn analyze_request(language: Option<&str>, image: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();

    if let Some(language) = language {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"language\"\r\n\r\n{language}\r\n"
            )
            .as_bytes(),
        );
    }

    let (file_name, bytes): (&str, &[u8]) = match image {
        Some((name, bytes)) => (name, bytes),
        None => ("", &[]),
    };
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// What the fake Gemini endpoint saw and how it answers.
#[derive(Clone)]
pub struct GeminiStub {
    pub hits: Arc<AtomicUsize>,
    pub last_api_key: Arc<Mutex<Option<String>>>,
    pub last_body: Arc<Mutex<Option<Value>>>,
    status: StatusCode,
    reply: Value,
}

impl GeminiStub {
    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_body(&self) -> Value {
        self.last_body.lock().unwrap().clone().expect("no request received")
    }

    pub fn last_api_key(&self) -> Option<String> {
        self.last_api_key.lock().unwrap().clone()
    }
}

async fn generate_content(
    State(stub): State<GeminiStub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    *stub.last_api_key.lock().unwrap() = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    *stub.last_body.lock().unwrap() = Some(body);
    (stub.status, Json(stub.reply.clone()))
}

/// Start a fake Gemini API; returns the base URL to configure and the stub.
pub async fn spawn_gemini_stub(status: StatusCode, reply: Value) -> (String, GeminiStub) {
    let stub = GeminiStub {
        hits: Arc::new(AtomicUsize::new(0)),
        last_api_key: Arc::new(Mutex::new(None)),
        last_body: Arc::new(Mutex::new(None)),
        status,
        reply,
    };

    let router = Router::new()
        .route("/v1beta/models/:call", post(generate_content))
        .with_state(stub.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{}/v1beta", addr), stub)
}

pub fn gemini_settings(api_base: &str, api_key: Option<&str>) -> GeminiSettings {
    let mut settings = GeminiSettings::new(api_key.map(|k| Secret::new(k.to_string())));
    settings.api_base = api_base.to_string();
    settings.request_timeout_secs = Some(10);
    settings
}

pub fn text_reply(text: &str) -> Value {
    serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 300, "candidatesTokenCount": 40 }
    })
}

//! In-process stand-in for the analysis service
//!
//! `/predict` answers according to the uploaded file name:
//! - `*unavailable*` -> 503 `{"error": "model unavailable"}`
//! - `*garbage*` -> 200 with a body missing every field
//! - anything else -> a Papillary/Malignant diagnosis
//!
//! `/generate_report` returns a small PDF unless the prediction result is
//! `Broken`, in which case it returns HTML.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const FAKE_PDF: &[u8] = b"%PDF-1.4\n% fake report\n";

#[derive(Default)]
pub struct Recorded {
    /// (file name, byte count) per `/predict` upload
    pub uploads: Mutex<Vec<(String, usize)>>,
    pub report_requests: Mutex<Vec<Value>>,
}

pub struct FakeService {
    pub base_url: String,
    pub recorded: Arc<Recorded>,
    handle: JoinHandle<()>,
}

impl FakeService {
    pub async fn start() -> Self {
        let recorded = Arc::new(Recorded::default());
        let app = Router::new()
            .route("/predict", post(predict))
            .route("/generate_report", post(generate_report))
            .route("/health", get(health))
            .with_state(recorded.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake service");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Fake service failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            recorded,
            handle,
        }
    }

    pub fn uploads(&self) -> Vec<(String, usize)> {
        self.recorded.uploads.lock().clone()
    }

    pub fn report_requests(&self) -> Vec<Value> {
        self.recorded.report_requests.lock().clone()
    }
}

impl Drop for FakeService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn predict(State(recorded): State<Arc<Recorded>>, mut multipart: Multipart) -> Response {
    let mut upload = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap_or_default();
        upload = Some((name, bytes.len()));
    }

    let Some((name, len)) = upload else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No file uploaded" })),
        )
            .into_response();
    };
    recorded.uploads.lock().push((name.clone(), len));

    if name.contains("unavailable") {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "model unavailable" })),
        )
            .into_response();
    }
    if name.contains("garbage") {
        return Json(json!({ "status": "ok" })).into_response();
    }

    Json(json!({
        "result": "Papillary",
        "diagnosis": "Malignant",
        "confidence": "92.00%",
        "recommendation": "Consult an endocrinologist for surgical planning.",
        "heatmap_url": format!("/results/heatmap_{name}"),
        "original_url": format!("/uploads/{name}"),
    }))
    .into_response()
}

async fn generate_report(State(recorded): State<Arc<Recorded>>, Json(body): Json<Value>) -> Response {
    let broken = body["prediction"]["result"] == "Broken";
    recorded.report_requests.lock().push(body);

    if broken {
        return ([(header::CONTENT_TYPE, "text/html")], "<html>error</html>").into_response();
    }
    ([(header::CONTENT_TYPE, "application/pdf")], FAKE_PDF).into_response()
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "model_loaded": true }))
}

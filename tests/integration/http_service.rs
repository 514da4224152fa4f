//! HTTP clients against the fake analysis service

use std::sync::Arc;
use std::time::Duration;

use super::common::fake_service::{FakeService, FAKE_PDF};
use super::common::fixtures::png;
use tempfile::TempDir;
use thyroscan::inference::mock::sample_payload;
use thyroscan::report::{report_file_name, ExportError, ReportExporter};
use thyroscan::{Diagnosis, HttpInferenceClient, HttpReportRenderer, InferenceClient, InferenceError};

fn client(service: &FakeService) -> HttpInferenceClient {
    HttpInferenceClient::new(&service.base_url, Duration::from_secs(5)).expect("client")
}

#[tokio::test]
async fn test_predict_decodes_diagnosis() {
    let service = FakeService::start().await;

    let payload = client(&service).predict(&png("nodule.png")).await.unwrap();

    assert_eq!(payload.result, "Papillary");
    assert_eq!(payload.diagnosis, Diagnosis::Malignant);
    assert_eq!(payload.confidence, "92.00%");
    assert_eq!(payload.heatmap_url, "/results/heatmap_nodule.png");
    assert_eq!(service.uploads(), vec![("nodule.png".to_string(), 12)]);
}

#[tokio::test]
async fn test_predict_prefers_server_error_message() {
    let service = FakeService::start().await;

    let err = client(&service)
        .predict(&png("unavailable.png"))
        .await
        .unwrap_err();

    assert_eq!(err, InferenceError::Service("model unavailable".to_string()));
    assert_eq!(err.user_message(), "model unavailable");
}

#[tokio::test]
async fn test_predict_without_result_is_unknown_error() {
    let service = FakeService::start().await;

    let err = client(&service).predict(&png("garbage.png")).await.unwrap_err();

    assert!(matches!(err, InferenceError::Validation(_)));
    assert_eq!(err.user_message(), "Unknown error");
}

#[tokio::test]
async fn test_unreachable_service_is_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpInferenceClient::new(format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let err = client.predict(&png("a.png")).await.unwrap_err();
    assert!(matches!(err, InferenceError::Network(_)));
}

#[tokio::test]
async fn test_health_reports_model_state() {
    let service = FakeService::start().await;
    let health = client(&service).health().await.unwrap();
    assert_eq!(health.status, "healthy");
    assert!(health.model_loaded);
}

#[tokio::test]
async fn test_report_export_saves_pdf() {
    let service = FakeService::start().await;
    let dir = TempDir::new().unwrap();
    let renderer = HttpReportRenderer::new(&service.base_url, Duration::from_secs(5)).unwrap();
    let exporter = ReportExporter::new(Arc::new(renderer), dir.path().join("reports"));

    let path = exporter
        .export(&sample_payload("Papillary", "Malignant"))
        .await
        .unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), FAKE_PDF);

    let requests = service.report_requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request["dataset"], "Thyroid Ultrasound");
    assert_eq!(request["prediction"]["diagnosis"], "Malignant");
    let id = request["id"].as_i64().unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        report_file_name(id)
    );
}

#[tokio::test]
async fn test_report_export_rejects_non_pdf() {
    let service = FakeService::start().await;
    let dir = TempDir::new().unwrap();
    let renderer = HttpReportRenderer::new(&service.base_url, Duration::from_secs(5)).unwrap();
    let exporter = ReportExporter::new(Arc::new(renderer), dir.path().to_path_buf());

    let err = exporter
        .export(&sample_payload("Broken", "Malignant"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::InvalidDocument));
}

#[tokio::test]
async fn test_report_export_surfaces_http_status() {
    let service = FakeService::start().await;
    let dir = TempDir::new().unwrap();
    // Wrong path, so the service answers 404
    let renderer = HttpReportRenderer::new(
        format!("{}/missing", service.base_url),
        Duration::from_secs(5),
    )
    .unwrap();
    let exporter = ReportExporter::new(Arc::new(renderer), dir.path().to_path_buf());

    let err = exporter
        .export(&sample_payload("Benign", "Benign"))
        .await
        .unwrap_err();
    assert!(matches!(err, ExportError::Rejected { status: 404 }));
}

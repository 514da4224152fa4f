//! Scan submission end to end: workflow, SQLite persistence and history

use std::sync::Arc;
use std::time::Duration;

use super::common::fake_service::FakeService;
use super::common::fixtures::{create_test_stores, identity, png, scan_at};
use thyroscan::data::ScanRepository;
use thyroscan::inference::mock::{sample_payload, MockInferenceClient};
use thyroscan::report::MockReportRenderer;
use thyroscan::{
    Backends, Config, Dashboard, Diagnosis, HistoryViewModel, HttpInferenceClient,
    LocalSessionStore, ScanWorkflow, SubmissionMode, WorkflowOutcome, WorkflowStage,
    WorkflowTimings,
};

#[tokio::test]
async fn test_submission_persists_and_refreshes_history() {
    let service = FakeService::start().await;
    let stores = create_test_stores();
    let history = HistoryViewModel::new(stores.scans.clone());
    let inference = HttpInferenceClient::new(&service.base_url, Duration::from_secs(5)).unwrap();
    let workflow = ScanWorkflow::new(
        Arc::new(inference),
        stores.scans.clone(),
        history.clone(),
        WorkflowTimings::default(),
    );
    let alice = identity("alice");

    let outcome = workflow
        .submit(png("nodule.png"), SubmissionMode::Fast, Some(alice.clone()))
        .await
        .unwrap();

    let WorkflowOutcome::Completed { record, .. } = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    let record = record.expect("record should be saved");
    assert_eq!(record.subtype, "Papillary");
    assert_eq!(record.diagnosis, Diagnosis::Malignant);
    assert_eq!(record.heatmap_url, "/results/heatmap_nodule.png");

    let stored = stores.scans.query_by_user(&alice.id).await.unwrap();
    assert_eq!(stored, vec![record.clone()]);
    assert_eq!(history.records(), vec![record]);
}

#[tokio::test]
async fn test_service_failure_writes_nothing() {
    let service = FakeService::start().await;
    let stores = create_test_stores();
    let history = HistoryViewModel::new(stores.scans.clone());
    let inference = HttpInferenceClient::new(&service.base_url, Duration::from_secs(5)).unwrap();
    let workflow = ScanWorkflow::new(
        Arc::new(inference),
        stores.scans.clone(),
        history,
        WorkflowTimings::default(),
    );
    let alice = identity("alice");

    let outcome = workflow
        .submit(png("unavailable.png"), SubmissionMode::Fast, Some(alice.clone()))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        WorkflowOutcome::Failed {
            session: outcome.session(),
            message: "model unavailable".to_string()
        }
    );
    assert_eq!(workflow.stage(), WorkflowStage::Failed);
    assert!(stores.scans.query_by_user(&alice.id).await.unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_newest_file_wins_while_analyzing() {
    let stores = create_test_stores();
    let history = HistoryViewModel::new(stores.scans.clone());
    let inference = MockInferenceClient::new()
        .respond_after(Duration::from_secs(8), Ok(sample_payload("Benign", "Benign")))
        .respond_after(Duration::from_millis(500), Ok(sample_payload("Follicular", "Malignant")));
    let workflow = ScanWorkflow::new(
        Arc::new(inference),
        stores.scans.clone(),
        history.clone(),
        WorkflowTimings::default(),
    );
    let alice = identity("alice");

    let first = tokio::spawn({
        let workflow = workflow.clone();
        let alice = alice.clone();
        async move {
            workflow
                .submit(png("first.png"), SubmissionMode::Guided, Some(alice))
                .await
        }
    });

    // Let the first submission reach Analyzing
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(workflow.stage(), WorkflowStage::Analyzing);

    let second = workflow
        .submit(png("second.png"), SubmissionMode::Guided, Some(alice.clone()))
        .await
        .unwrap();
    let first = first.await.unwrap().unwrap();

    assert!(matches!(first, WorkflowOutcome::Superseded { .. }));
    assert!(matches!(second, WorkflowOutcome::Completed { .. }));

    let current = workflow.current().unwrap();
    assert_eq!(current.source.file_name, "second.png");
    assert_eq!(current.payload.unwrap().result, "Follicular");

    let stored = stores.scans.query_by_user(&alice.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].subtype, "Follicular");
}

#[tokio::test]
async fn test_history_orders_newest_first_and_deletes() {
    let stores = create_test_stores();
    let old = stores.scans.add(scan_at("alice", "Benign", 60)).await.unwrap();
    let new = stores.scans.add(scan_at("alice", "Papillary", 5)).await.unwrap();
    stores.scans.add(scan_at("bob", "Medullary", 1)).await.unwrap();

    let history = HistoryViewModel::new(stores.scans.clone());
    let loaded = history.load(&identity("alice").id).await.unwrap();
    assert_eq!(loaded, 2);
    let ids: Vec<_> = history.records().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![new.id, old.id]);

    history.delete(new.id).await.unwrap();
    assert_eq!(history.records(), vec![old.clone()]);
    assert_eq!(
        stores.scans.query_by_user(&identity("alice").id).await.unwrap(),
        vec![old]
    );
}

#[tokio::test]
async fn test_failed_delete_leaves_history_unchanged() {
    let stores = create_test_stores();
    let record = stores.scans.add(scan_at("alice", "Benign", 10)).await.unwrap();
    let history = HistoryViewModel::new(stores.scans.clone());
    history.load(&identity("alice").id).await.unwrap();

    // Removed behind the view model's back, so the repository delete fails
    stores.scans.delete(record.id).await.unwrap();
    assert!(history.delete(record.id).await.is_err());
    assert_eq!(history.records(), vec![record]);
}

#[tokio::test]
async fn test_dashboard_routes_by_preference_and_persists() {
    let service = FakeService::start().await;
    let stores = create_test_stores();
    let session = Arc::new(LocalSessionStore::signed_in(identity("alice")));
    let config = Config {
        reports_dir: stores.dir.path().join("reports"),
        ..Config::default()
    };
    let dashboard = Dashboard::new(
        Backends {
            session: session.clone(),
            profiles: stores.profiles.clone(),
            scans: stores.scans.clone(),
            blobs: stores.blobs.clone(),
            inference: Arc::new(
                HttpInferenceClient::new(&service.base_url, Duration::from_secs(5)).unwrap(),
            ),
            reports: Arc::new(MockReportRenderer::new().respond(Ok(b"%PDF-1.7".to_vec()))),
        },
        &config,
    );
    dashboard.on_identity_changed(Some(identity("alice"))).await;
    assert_eq!(dashboard.submission_mode(), SubmissionMode::Fast);

    let outcome = dashboard.submit_scan(png("nodule.png")).await.unwrap();
    assert!(matches!(outcome, WorkflowOutcome::Completed { record: Some(_), .. }));
    assert_eq!(dashboard.history().len(), 1);

    let report = dashboard.export_latest_report().await.unwrap();
    assert!(report.starts_with(stores.dir.path().join("reports")));
}

//! Quick-check and follow-up flows through the public engine API.

use marginwatch::backend::MockBackend;
use marginwatch::{EngineError, ReportEngine, ReportStore, RequestKind, Severity};
use std::sync::Arc;
use std::time::Duration;

fn setup(backend: MockBackend) -> (ReportEngine, Arc<MockBackend>, Arc<ReportStore>) {
    let backend = Arc::new(backend);
    let store = Arc::new(ReportStore::new());
    let engine = ReportEngine::new(backend.clone(), store.clone(), Duration::from_secs(10));
    (engine, backend, store)
}

#[tokio::test]
async fn quick_check_then_full_follow_up_chain() {
    let (engine, backend, store) = setup(
        MockBackend::new()
            .with_check_response(serde_json::json!({
                "type": "interrupt",
                "thread_id": "t1",
                "interrupt_data": {
                    "report": "WARN: LP_A at 92%",
                    "accounts_detail": { "LP_A": { "margin_level": 92 } }
                }
            }))
            .with_check_response(serde_json::json!({
                "type": "complete", "thread_id": "t1", "content": "improved to 75%"
            }))
            .with_check_response(serde_json::json!({
                "type": "complete", "thread_id": "t1", "content": "simulation clears all alerts"
            }))
            .with_check_response(serde_json::json!({
                "type": "complete", "thread_id": "t1", "content": "executed"
            })),
    );

    let first = engine.quick_check().await;
    assert_eq!(first.status, Severity::Warn);
    assert!(first.accounts_detail.is_some());

    let rechecked = engine.recheck().await.unwrap();
    assert!(rechecked.sections[0].content.contains("improved"));

    let simulated = engine.simulate().await.unwrap();
    assert!(simulated.sections[0].content.contains("simulation"));

    let executed = engine.execute().await.unwrap();
    assert_eq!(store.current().unwrap(), executed);

    let kinds: Vec<RequestKind> = backend.check_calls().iter().map(|(k, _)| *k).collect();
    assert_eq!(
        kinds,
        vec![
            RequestKind::QuickCheck,
            RequestKind::Recheck,
            RequestKind::Simulate,
            RequestKind::Execute
        ]
    );
    // Every call in the chain carried the same correlation thread.
    assert!(backend.check_calls().iter().all(|(_, t)| t.as_str() == "t1"));
}

#[tokio::test]
async fn every_response_shape_resolves_to_a_renderable_report() {
    let (engine, _backend, store) = setup(
        MockBackend::new()
            .with_check_response(serde_json::json!({
                "type": "complete", "thread_id": "a", "content": "fine"
            }))
            .with_check_response(serde_json::json!({ "totally": "unexpected" }))
            .with_check_response(serde_json::json!({
                "type": "error", "error": "auth failed"
            }))
            .with_check_error(marginwatch::BackendError::Timeout),
    );

    for expected in [Severity::Ok, Severity::Warn, Severity::Critical, Severity::Critical] {
        let report = engine.quick_check().await;
        assert_eq!(report.status, expected);
        assert!(!report.sections.is_empty());
        assert!(!store.is_checking(), "busy flag resolved after settle");
    }
}

#[tokio::test]
async fn follow_up_with_no_history_is_a_precondition_error() {
    let (engine, backend, _store) = setup(MockBackend::new());

    let err = engine.recheck().await.unwrap_err();
    assert!(matches!(err, EngineError::NoCurrentReport));
    assert_eq!(backend.check_calls().len(), 0);
}

#[tokio::test]
async fn lookup_flow_feeds_the_report_store() {
    let (engine, _backend, store) = setup(MockBackend::new().with_check_response(
        serde_json::json!({ "type": "complete", "thread_id": "t1", "content": "LP_A healthy" }),
    ));

    assert!(engine.lookup("what's up").await.unwrap().is_none());
    assert!(store.current().is_none());

    let report = engine.lookup("check LP_A").await.unwrap().unwrap();
    assert_eq!(report.title, "Margin Report: LP_A");
    assert_eq!(report.status, Severity::Ok);

    // The lookup result becomes the current report, so follow-ups work.
    let rechecked = engine.recheck().await.unwrap();
    assert_eq!(rechecked.card_id.as_str(), "t1");
}

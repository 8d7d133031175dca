mod common;

use common::{demo_csv_path, FixedClassifier, KeywordEmbedder, Mocks, ScriptedLlm, TRUE_VERDICT};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use vf_ai::index::IndexStatus;
use vf_ai::service::{FactCheckService, ServiceStateKind};
use vf_core::config::AppConfig;
use vf_core::domain::Verdict;

fn config(dir: &TempDir) -> AppConfig {
    AppConfig {
        corpus_csv_path: demo_csv_path(),
        store_path: dir.path().join("store.sqlite"),
        ..AppConfig::default()
    }
}

fn mocks() -> Mocks {
    Mocks::new(
        ScriptedLlm::new("[\"India became the 5th largest economy in 2022\"]", TRUE_VERDICT),
        KeywordEmbedder::new("qwen3-embedding:0.6b"),
        FixedClassifier::label("CFS", 0.9),
    )
}

#[test]
fn refuses_requests_before_initialization() {
    let service = FactCheckService::new();
    let err = service.check("India became the 5th largest economy").expect_err("not ready");
    assert_eq!(err.code, "SERVICE_NOT_READY");
    assert_eq!(service.status().state, ServiceStateKind::Uninitialized);
    assert!(!service.is_ready());
}

#[test]
fn initialization_indexes_warms_up_and_reports_ready() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mocks = mocks();
    let mut service = FactCheckService::new();

    let summary = service.initialize(&config(&dir), mocks.providers()).expect("initialize");
    assert_eq!(summary.status, IndexStatus::Created);
    assert_eq!(summary.document_count, 8);

    // Warm-up ran one full pass.
    assert_eq!(mocks.classifier.count(), 1);
    assert_eq!(mocks.llm.total_calls(), 2);

    let status = service.status();
    assert_eq!(status.state, ServiceStateKind::Ready);
    assert_eq!(status.document_count, Some(8));
    assert_eq!(status.embedding_model.as_deref(), Some("qwen3-embedding:0.6b"));
    assert!(service.is_ready());
}

#[test]
fn warm_up_can_be_disabled() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mocks = mocks();
    let mut service = FactCheckService::new();
    let cfg = AppConfig {
        warmup_on_start: false,
        ..config(&dir)
    };
    service.initialize(&cfg, mocks.providers()).expect("initialize");
    assert_eq!(mocks.classifier.count(), 0);
    assert!(service.is_ready());
}

#[test]
fn check_trims_input_and_rejects_blank_text() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut service = FactCheckService::new();
    service.initialize(&config(&dir), mocks().providers()).expect("initialize");

    let err = service.check("   \n").expect_err("blank");
    assert_eq!(err.code, "INPUT_EMPTY");

    let got = service
        .check("  India became the 5th largest economy in 2022  ")
        .expect("check");
    assert_eq!(got.original_input, "India became the 5th largest economy in 2022");
    assert_eq!(got.verdict, Verdict::True);
}

#[test]
fn restart_reuses_the_populated_store_without_the_corpus() {
    let dir = tempfile::tempdir().expect("tempdir");
    FactCheckService::new()
        .initialize(&config(&dir), mocks().providers())
        .expect("first start");

    let cfg = AppConfig {
        corpus_csv_path: dir.path().join("gone.csv"),
        ..config(&dir)
    };
    let mut service = FactCheckService::new();
    let summary = service.initialize(&cfg, mocks().providers()).expect("second start");
    assert_eq!(summary.status, IndexStatus::AlreadyPopulated);
    assert_eq!(summary.document_count, 8);
}

#[test]
fn failed_initialization_is_sticky_and_explained() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = AppConfig {
        corpus_csv_path: dir.path().join("missing.csv"),
        ..config(&dir)
    };
    let mut service = FactCheckService::new();

    let err = service.initialize(&cfg, mocks().providers()).expect_err("missing corpus");
    assert_eq!(err.code, "CORPUS_READ_FAILED");

    let status = service.status();
    assert_eq!(status.state, ServiceStateKind::Failed);
    assert!(status.message.expect("message").contains("CORPUS_READ_FAILED"));

    let err = service.check("anything").expect_err("not ready");
    assert_eq!(err.code, "SERVICE_NOT_READY");
}

#[test]
fn invalid_config_fails_before_touching_the_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = AppConfig {
        top_k: 0,
        ..config(&dir)
    };
    let mut service = FactCheckService::new();
    let err = service.initialize(&cfg, mocks().providers()).expect_err("invalid");
    assert_eq!(err.code, "CONFIG_INVALID");
    assert!(!cfg.store_path.exists());
}

#[test]
fn concurrent_checks_share_one_service() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<FactCheckService>();

    let dir = tempfile::tempdir().expect("tempdir");
    let mut service = FactCheckService::new();
    service.initialize(&config(&dir), mocks().providers()).expect("initialize");

    let service = &service;
    std::thread::scope(|s| {
        let handles = (0..4)
            .map(|_| s.spawn(move || service.check("India became the 5th largest economy in 2022")))
            .collect::<Vec<_>>();
        for h in handles {
            let got = h.join().expect("join").expect("check");
            assert_eq!(got.verdict, Verdict::True);
        }
    });
}

mod common;

use std::cell::Cell;

use common::{demo_corpus, temp_store, KeywordEmbedder};
use pretty_assertions::assert_eq;
use vf_ai::embeddings::Embedder;
use vf_ai::index::{ensure_index, IndexStatus};
use vf_core::error::AppError;
use vf_core::ingest::corpus_csv::CorpusLoad;

#[test]
fn indexes_once_and_skips_loader_when_populated() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = temp_store(&dir);
    let embedder = KeywordEmbedder::new("mock-embed");
    let loads = Cell::new(0);

    let first = ensure_index(&store, &embedder, 3, || {
        loads.set(loads.get() + 1);
        Ok(demo_corpus())
    })
    .expect("first index");
    assert_eq!(first.status, IndexStatus::Created);
    assert_eq!(first.document_count, 8);
    assert_eq!(first.dims, 13);
    assert_eq!(first.embedding_model, "mock-embed");
    // 8 facts in batches of 3.
    assert_eq!(embedder.batch_count(), 3);

    let second = ensure_index(&store, &embedder, 3, || {
        loads.set(loads.get() + 1);
        Ok(demo_corpus())
    })
    .expect("second index");
    assert_eq!(second.status, IndexStatus::AlreadyPopulated);
    assert_eq!(second.document_count, first.document_count);
    assert_eq!(second.dims, first.dims);
    assert_eq!(loads.get(), 1);
    assert_eq!(embedder.batch_count(), 3);
    assert_eq!(store.count().expect("count"), 8);
}

#[test]
fn populated_store_rejects_a_different_embedding_model() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = temp_store(&dir);
    ensure_index(&store, &KeywordEmbedder::new("model-a"), 32, || Ok(demo_corpus())).expect("index");

    let err = ensure_index(&store, &KeywordEmbedder::new("model-b"), 32, || Ok(demo_corpus()))
        .expect_err("model mismatch");
    assert_eq!(err.code, "STORE_PROVIDER_MISMATCH");
}

#[test]
fn empty_corpus_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = temp_store(&dir);
    let err = ensure_index(&store, &KeywordEmbedder::new("m"), 8, || {
        Ok(CorpusLoad {
            facts: Vec::new(),
            warnings: Vec::new(),
        })
    })
    .expect_err("empty corpus");
    assert_eq!(err.code, "CORPUS_EMPTY");
}

#[test]
fn loader_errors_propagate_and_leave_store_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = temp_store(&dir);
    let err = ensure_index(&store, &KeywordEmbedder::new("m"), 8, || {
        Err(AppError::new("CORPUS_READ_FAILED", "missing"))
    })
    .expect_err("loader failure");
    assert_eq!(err.code, "CORPUS_READ_FAILED");
    assert_eq!(store.count().expect("count"), 0);
}

struct RaggedEmbedder;

impl Embedder for RaggedEmbedder {
    fn model(&self) -> &str {
        "ragged"
    }

    fn embed(&self, input: &str) -> Result<Vec<f32>, AppError> {
        // Dimension depends on input length parity.
        Ok(vec![1.0; 2 + input.len() % 2])
    }
}

#[test]
fn inconsistent_dimensions_abort_before_writing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = temp_store(&dir);
    let corpus = demo_corpus();
    let lens = corpus.facts.iter().map(|f| f.statement.len() % 2).collect::<Vec<_>>();
    assert!(lens.contains(&0) && lens.contains(&1), "fixture needs both parities");

    let err = ensure_index(&store, &RaggedEmbedder, 4, || Ok(corpus)).expect_err("ragged dims");
    assert_eq!(err.code, "AI_EMBEDDINGS_FAILED");
    assert_eq!(store.count().expect("count"), 0);
}

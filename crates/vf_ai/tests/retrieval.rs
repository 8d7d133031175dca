mod common;

use std::sync::Arc;

use common::{demo_corpus, temp_store, KeywordEmbedder};
use pretty_assertions::assert_eq;
use vf_ai::index::ensure_index;
use vf_ai::retrieve::Retriever;

fn indexed_retriever(dir: &tempfile::TempDir, embedder: KeywordEmbedder) -> Retriever {
    let store = temp_store(dir);
    ensure_index(&store, &embedder, 32, || Ok(demo_corpus())).expect("index");
    Retriever::new(store, Arc::new(embedder)).expect("retriever")
}

#[test]
fn matching_statement_ranks_first_with_full_similarity() {
    let dir = tempfile::tempdir().expect("tempdir");
    let retriever = indexed_retriever(&dir, KeywordEmbedder::new("mock-embed"));

    let got = retriever
        .retrieve("India became the 5th largest economy in 2022", 3)
        .expect("retrieve");

    assert_eq!(got.hits.len(), 3);
    assert_eq!(got.hits[0].fact_id, "1");
    assert_eq!(got.hits[0].score, 1.0);
    assert_eq!(got.hits[0].distance, 0.0);
    assert_eq!(got.hits[0].source, "PIB");
    assert_eq!(got.hits[0].category, "economy");
    assert!(got.documents()[0].starts_with("India became the fifth largest economy"));

    let scores = got.scores();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]), "scores not descending: {scores:?}");
    assert!(scores.iter().all(|s| *s > 0.0 && *s <= 1.0));
    assert_eq!(got.max_score(), Some(1.0));
}

#[test]
fn k_larger_than_the_corpus_returns_everything() {
    let dir = tempfile::tempdir().expect("tempdir");
    let retriever = indexed_retriever(&dir, KeywordEmbedder::new("mock-embed"));
    let got = retriever.retrieve("payments", 50).expect("retrieve");
    assert_eq!(got.hits.len(), 8);
    assert_eq!(got.sources().len(), 8);
}

#[test]
fn empty_store_yields_no_evidence() {
    let dir = tempfile::tempdir().expect("tempdir");
    let retriever =
        Retriever::new(temp_store(&dir), Arc::new(KeywordEmbedder::new("mock-embed"))).expect("retriever");
    let got = retriever.retrieve("anything", 3).expect("retrieve");
    assert!(got.hits.is_empty());
    assert_eq!(got.max_score(), None);
}

#[test]
fn embedding_failure_is_a_retrieval_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let retriever = indexed_retriever(&dir, KeywordEmbedder::failing_queries("mock-embed"));
    let err = retriever.retrieve("India", 3).expect_err("embed failure");
    assert_eq!(err.code, "AI_RETRIEVAL_FAILED");
    assert!(err.retryable);
}

#[test]
fn retriever_refuses_a_store_built_by_another_model() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = temp_store(&dir);
    ensure_index(&store, &KeywordEmbedder::new("model-a"), 32, || Ok(demo_corpus())).expect("index");

    let err = Retriever::new(store, Arc::new(KeywordEmbedder::new("model-b")))
        .err()
        .expect("mismatch");
    assert_eq!(err.code, "STORE_PROVIDER_MISMATCH");
}

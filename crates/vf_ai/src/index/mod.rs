//! One-time corpus indexing: load, embed, bulk insert.

use serde::{Deserialize, Serialize};
use vf_core::domain::EmbeddedFact;
use vf_core::error::AppError;
use vf_core::ingest::corpus_csv::CorpusLoad;
use vf_core::store::FactStore;

use crate::embeddings::Embedder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    Created,
    AlreadyPopulated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub collection: String,
    pub document_count: usize,
    pub embedding_model: String,
    pub dims: usize,
    pub status: IndexStatus,
}

/// Populates the collection unless it already holds documents. `load` is only called
/// when the collection is empty.
pub fn ensure_index<F>(
    store: &FactStore,
    embedder: &dyn Embedder,
    batch_size: usize,
    load: F,
) -> Result<IndexSummary, AppError>
where
    F: FnOnce() -> Result<CorpusLoad, AppError>,
{
    if let Some(info) = store.info()?.filter(|i| i.document_count > 0) {
        store.ensure_provider(embedder.model(), None)?;
        tracing::info!(
            collection = %info.name,
            documents = info.document_count,
            "fact store already populated; skipping ingestion"
        );
        return Ok(IndexSummary {
            collection: info.name,
            document_count: info.document_count,
            embedding_model: info.embedding_model,
            dims: info.dims,
            status: IndexStatus::AlreadyPopulated,
        });
    }

    let corpus = load()?;
    for w in &corpus.warnings {
        tracing::warn!(code = %w.code, details = ?w.details, "{}", w.message);
    }
    if corpus.facts.is_empty() {
        return Err(AppError::new("CORPUS_EMPTY", "Corpus has no facts to index"));
    }

    let batch_size = batch_size.max(1);
    let mut records: Vec<EmbeddedFact> = Vec::with_capacity(corpus.facts.len());
    let mut dims: Option<usize> = None;

    for batch in corpus.facts.chunks(batch_size) {
        let inputs = batch.iter().map(|f| f.statement.clone()).collect::<Vec<_>>();
        let vectors = embedder.embed_batch(&inputs)?;
        if vectors.len() != batch.len() {
            return Err(AppError::new(
                "AI_EMBEDDINGS_FAILED",
                "Embedding batch returned the wrong number of vectors",
            )
            .with_details(format!("expected={}; got={}", batch.len(), vectors.len())));
        }

        for (fact, embedding) in batch.iter().zip(vectors) {
            let expected = *dims.get_or_insert(embedding.len());
            if embedding.is_empty() || embedding.len() != expected {
                return Err(AppError::new("AI_EMBEDDINGS_FAILED", "Embedding dims inconsistent")
                    .with_details(format!(
                        "fact_id={}; expected={}; got={}",
                        fact.id,
                        expected,
                        embedding.len()
                    )));
            }
            records.push(EmbeddedFact {
                fact: fact.clone(),
                embedding,
            });
        }
        tracing::debug!(embedded = records.len(), total = corpus.facts.len(), "embedding corpus");
    }

    let dims = dims.unwrap_or(0);
    let summary = store.bulk_insert(embedder.model(), &records)?;
    let status = if summary.skipped() {
        // Another writer populated the collection between the check and the insert.
        store.ensure_provider(embedder.model(), Some(dims))?;
        IndexStatus::AlreadyPopulated
    } else {
        IndexStatus::Created
    };

    tracing::info!(
        collection = store.collection(),
        documents = summary.document_count,
        dims,
        "fact store ready"
    );
    Ok(IndexSummary {
        collection: store.collection().to_string(),
        document_count: summary.document_count,
        embedding_model: embedder.model().to_string(),
        dims,
        status,
    })
}

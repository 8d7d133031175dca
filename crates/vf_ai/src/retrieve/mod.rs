use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vf_core::error::AppError;
use vf_core::store::FactStore;

use crate::embeddings::Embedder;

mod similarity;

pub use similarity::distance_to_similarity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedFact {
    pub fact_id: String,
    pub document: String,
    /// `1 / (1 + distance)`, in `(0, 1]`.
    pub score: f64,
    pub distance: f64,
    pub source: String,
    pub date: String,
    pub category: String,
}

/// Nearest verified statements for one query, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub query: String,
    pub hits: Vec<RetrievedFact>,
}

impl RetrievalResult {
    pub fn documents(&self) -> Vec<String> {
        self.hits.iter().map(|h| h.document.clone()).collect()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.hits.iter().map(|h| h.score).collect()
    }

    pub fn sources(&self) -> Vec<String> {
        self.hits.iter().map(|h| h.source.clone()).collect()
    }

    pub fn max_score(&self) -> Option<f64> {
        self.hits.iter().map(|h| h.score).reduce(f64::max)
    }
}

#[derive(Clone)]
pub struct Retriever {
    store: FactStore,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    /// Fails with `STORE_PROVIDER_MISMATCH` if the collection was built by another model.
    pub fn new(store: FactStore, embedder: Arc<dyn Embedder>) -> Result<Self, AppError> {
        store.ensure_provider(embedder.model(), None)?;
        Ok(Self { store, embedder })
    }

    pub fn store(&self) -> &FactStore {
        &self.store
    }

    pub fn retrieve(&self, claim: &str, k: usize) -> Result<RetrievalResult, AppError> {
        let q = claim.trim();
        if q.is_empty() {
            return Err(AppError::new("AI_RETRIEVAL_FAILED", "Query must not be empty"));
        }

        let qv = self.embedder.embed(q).map_err(|e| {
            AppError::new("AI_RETRIEVAL_FAILED", "Failed to embed claim")
                .with_details(e.to_string())
                .with_retryable(e.retryable)
        })?;

        let matches = self.store.query(&qv, k)?;
        let hits = matches
            .into_iter()
            .map(|m| RetrievedFact {
                fact_id: m.fact_id,
                document: m.document,
                score: distance_to_similarity(m.distance),
                distance: m.distance,
                source: m.metadata.source,
                date: m.metadata.date,
                category: m.metadata.category,
            })
            .collect::<Vec<_>>();

        tracing::info!(
            k,
            hits = hits.len(),
            best = hits.first().map(|h| h.score).unwrap_or(0.0),
            "retrieved facts"
        );
        Ok(RetrievalResult {
            query: q.to_string(),
            hits,
        })
    }
}

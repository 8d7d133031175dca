//! Startup barrier and request entry point.
//!
//! `initialize` finishes indexing, pipeline construction and the warm-up run before the
//! service reports `Ready`; `check` is refused until then.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vf_core::config::AppConfig;
use vf_core::error::AppError;
use vf_core::ingest::corpus_csv::load_corpus_file;
use vf_core::store::FactStore;

use crate::classify::{HttpTextClassifier, TextClassifier};
use crate::embeddings::{Embedder, OllamaEmbedder};
use crate::index::{ensure_index, IndexSummary};
use crate::llm::{Llm, OllamaLlm};
use crate::ollama::OllamaClient;
use crate::pipeline::{FactCheckResult, VerificationPipeline};

pub const WARMUP_QUERY: &str = "Test query for health check";

/// Inference backends, loaded once and shared by every request.
#[derive(Clone)]
pub struct Providers {
    pub llm: Arc<dyn Llm>,
    pub embedder: Arc<dyn Embedder>,
    pub classifier: Arc<dyn TextClassifier>,
}

impl Providers {
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let client = OllamaClient::new(&config.ollama_base_url)?;
        Ok(Self {
            llm: Arc::new(OllamaLlm::new(client.clone(), config.llm_timeout)),
            embedder: Arc::new(OllamaEmbedder::new(
                client,
                config.embedding_model.clone(),
                config.embed_timeout,
            )),
            classifier: Arc::new(HttpTextClassifier::new(
                &config.classifier_url,
                config.classifier_timeout,
            )?),
        })
    }
}

pub enum ServiceState {
    Uninitialized,
    Ready {
        pipeline: VerificationPipeline,
        summary: IndexSummary,
    },
    Failed(AppError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStateKind {
    Uninitialized,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub state: ServiceStateKind,
    pub document_count: Option<usize>,
    pub embedding_model: Option<String>,
    pub message: Option<String>,
}

pub struct FactCheckService {
    state: ServiceState,
}

impl Default for FactCheckService {
    fn default() -> Self {
        Self::new()
    }
}

impl FactCheckService {
    pub fn new() -> Self {
        Self {
            state: ServiceState::Uninitialized,
        }
    }

    pub fn state(&self) -> &ServiceState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ServiceState::Ready { .. })
    }

    /// Any failure leaves the service `Failed` and is returned.
    pub fn initialize(&mut self, config: &AppConfig, providers: Providers) -> Result<IndexSummary, AppError> {
        match Self::bring_up(config, &providers) {
            Ok((pipeline, summary)) => {
                tracing::info!(
                    collection = %summary.collection,
                    documents = summary.document_count,
                    "fact check service ready"
                );
                self.state = ServiceState::Ready {
                    pipeline,
                    summary: summary.clone(),
                };
                Ok(summary)
            }
            Err(e) => {
                tracing::error!(error = %e, "fact check service failed to start");
                self.state = ServiceState::Failed(e.clone());
                Err(e)
            }
        }
    }

    fn bring_up(
        config: &AppConfig,
        providers: &Providers,
    ) -> Result<(VerificationPipeline, IndexSummary), AppError> {
        config.validate()?;
        let store = FactStore::from_config(config)?;
        let summary = ensure_index(
            &store,
            providers.embedder.as_ref(),
            config.embed_batch_size,
            || load_corpus_file(&config.corpus_csv_path),
        )?;
        let pipeline = VerificationPipeline::from_config(config, providers, store)?;

        if config.warmup_on_start {
            tracing::info!("running warm-up query");
            pipeline.run(WARMUP_QUERY)?;
        }
        Ok((pipeline, summary))
    }

    /// Checks one claim. The input is trimmed before it reaches the pipeline.
    pub fn check(&self, text: &str) -> Result<FactCheckResult, AppError> {
        let pipeline = match &self.state {
            ServiceState::Ready { pipeline, .. } => pipeline,
            ServiceState::Uninitialized => {
                return Err(AppError::new("SERVICE_NOT_READY", "Service is not initialized"));
            }
            ServiceState::Failed(e) => {
                return Err(AppError::new("SERVICE_NOT_READY", "Service failed to initialize")
                    .with_details(e.to_string()));
            }
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::new("INPUT_EMPTY", "Claim text must not be empty"));
        }
        pipeline.run(text)
    }

    pub fn status(&self) -> ServiceStatus {
        match &self.state {
            ServiceState::Uninitialized => ServiceStatus {
                state: ServiceStateKind::Uninitialized,
                document_count: None,
                embedding_model: None,
                message: None,
            },
            ServiceState::Ready { summary, .. } => ServiceStatus {
                state: ServiceStateKind::Ready,
                document_count: Some(summary.document_count),
                embedding_model: Some(summary.embedding_model.clone()),
                message: None,
            },
            ServiceState::Failed(e) => ServiceStatus {
                state: ServiceStateKind::Failed,
                document_count: None,
                embedding_model: None,
                message: Some(e.to_string()),
            },
        }
    }
}

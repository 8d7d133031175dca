//! Request orchestration: detect, extract, retrieve, verify.
//!
//! A run is one blocking sequence of calls. The pipeline holds only shared read-only
//! handles, so one instance serves concurrent requests by reference.

use serde::{Deserialize, Serialize};
use vf_core::config::AppConfig;
use vf_core::domain::Verdict;
use vf_core::error::AppError;
use vf_core::store::FactStore;

use crate::classify::{ClaimWorthinessClassifier, DetectionOutcome};
use crate::extract::{claims_or_input, ClaimExtractor};
use crate::retrieve::Retriever;
use crate::salvage::ParseKind;
use crate::service::Providers;
use crate::verify::{VerdictSource, Verifier};

pub const NOT_A_CLAIM_REASONING: &str =
    "The input does not appear to contain a factual claim that can be verified.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Detecting,
    ShortCircuitUnverifiable,
    Extracting,
    Retrieving,
    Verifying,
    Done,
}

/// Where `confidence_score` came from. Neither is a calibrated verdict probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceSource {
    /// Classifier score of a short-circuited, non-claim input.
    Detection,
    /// Best evidence similarity.
    Retrieval,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    pub detection: DetectionOutcome,
    /// `None` when the request short-circuited before extraction.
    pub extraction: Option<ParseKind>,
    pub verdict_source: Option<VerdictSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCheckResult {
    pub original_input: String,
    pub extracted_claim: String,
    /// Claims after the first. Reported but not verified.
    pub additional_claims: Vec<String>,
    pub verdict: Verdict,
    /// Nearest verified statements, best first.
    pub evidence: Vec<String>,
    pub evidence_sources: Vec<String>,
    pub reasoning: String,
    pub confidence_score: Option<f64>,
    pub confidence_source: ConfidenceSource,
    pub diagnostics: PipelineDiagnostics,
}

#[derive(Clone)]
pub struct VerificationPipeline {
    classifier: ClaimWorthinessClassifier,
    extractor: ClaimExtractor,
    retriever: Retriever,
    verifier: Verifier,
    top_k: usize,
}

impl VerificationPipeline {
    pub fn new(
        classifier: ClaimWorthinessClassifier,
        extractor: ClaimExtractor,
        retriever: Retriever,
        verifier: Verifier,
        top_k: usize,
    ) -> Self {
        Self {
            classifier,
            extractor,
            retriever,
            verifier,
            top_k,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        providers: &Providers,
        store: FactStore,
    ) -> Result<Self, AppError> {
        Ok(Self::new(
            ClaimWorthinessClassifier::new(providers.classifier.clone(), config.worthy_label.clone()),
            ClaimExtractor::new(providers.llm.clone(), config.extraction_model.clone()),
            Retriever::new(store, providers.embedder.clone())?,
            Verifier::new(providers.llm.clone(), config.verification_model.clone()),
            config.top_k,
        ))
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Only retrieval failures are fatal; every other stage degrades.
    pub fn run(&self, input: &str) -> Result<FactCheckResult, AppError> {
        tracing::info!(stage = ?PipelineStage::Detecting, chars = input.chars().count(), "fact check started");
        let detection = self.classifier.classify(input);

        if !detection.is_claim_worthy {
            tracing::info!(stage = ?PipelineStage::ShortCircuitUnverifiable, score = detection.score, "input is not claim-worthy");
            return Ok(FactCheckResult {
                original_input: input.to_string(),
                extracted_claim: input.to_string(),
                additional_claims: Vec::new(),
                verdict: Verdict::Unverifiable,
                evidence: Vec::new(),
                evidence_sources: Vec::new(),
                reasoning: NOT_A_CLAIM_REASONING.to_string(),
                confidence_score: Some(detection.score),
                confidence_source: ConfidenceSource::Detection,
                diagnostics: PipelineDiagnostics {
                    detection: detection.outcome,
                    extraction: None,
                    verdict_source: None,
                },
            });
        }

        tracing::info!(stage = ?PipelineStage::Extracting, "extracting claims");
        let extraction = self.extractor.extract_detailed(input);
        let extraction_kind = ParseKind::from(&extraction);
        let mut claims = claims_or_input(extraction).into_iter();
        let main_claim = claims.next().unwrap_or_else(|| input.to_string());
        let additional_claims = claims.collect::<Vec<_>>();

        tracing::info!(stage = ?PipelineStage::Retrieving, top_k = self.top_k, "retrieving evidence");
        let retrieval = self.retriever.retrieve(&main_claim, self.top_k)?;
        let evidence = retrieval.documents();

        tracing::info!(stage = ?PipelineStage::Verifying, evidence = evidence.len(), "verifying claim");
        let verification = self.verifier.verify(&main_claim, &evidence);

        let confidence = retrieval.max_score().unwrap_or(0.0);
        tracing::info!(
            stage = ?PipelineStage::Done,
            verdict = %verification.verdict,
            confidence,
            "fact check finished"
        );
        Ok(FactCheckResult {
            original_input: input.to_string(),
            extracted_claim: main_claim,
            additional_claims,
            verdict: verification.verdict,
            evidence,
            evidence_sources: retrieval.sources(),
            reasoning: verification.reasoning,
            confidence_score: Some(confidence),
            confidence_source: ConfidenceSource::Retrieval,
            diagnostics: PipelineDiagnostics {
                detection: detection.outcome,
                extraction: Some(extraction_kind),
                verdict_source: Some(verification.source),
            },
        })
    }
}

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use vf_ai::classify::{ClassifierLabel, TextClassifier};
use vf_ai::embeddings::Embedder;
use vf_ai::llm::Llm;
use vf_ai::service::Providers;
use vf_core::error::AppError;
use vf_core::ingest::corpus_csv::{parse_corpus_csv, CorpusLoad};
use vf_core::store::FactStore;

pub const DEMO_CSV: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../fixtures/demo/verified_facts.csv"
));

pub fn demo_csv_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/demo/verified_facts.csv")
}

pub fn demo_corpus() -> CorpusLoad {
    parse_corpus_csv(DEMO_CSV).expect("demo corpus")
}

pub fn temp_store(dir: &TempDir) -> FactStore {
    FactStore::open(&dir.path().join("store.sqlite"), "verified_facts", Duration::from_secs(5))
        .expect("open store")
}

/// Topic words counted by [`KeywordEmbedder`].
const VOCAB: [&str; 12] = [
    "india", "economy", "largest", "2022", "lunar", "payments", "accounts", "g20",
    "parliament", "vaccination", "women", "sky",
];

/// Deterministic embedder: counts of [`VOCAB`] words plus a bias term, L2-normalised.
/// Texts sharing the same topic words embed identically.
pub struct KeywordEmbedder {
    model: String,
    pub single_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
    fail_single: bool,
}

impl KeywordEmbedder {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            single_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
            fail_single: false,
        }
    }

    /// Indexing still works; query-time embedding fails.
    pub fn failing_queries(model: &str) -> Self {
        Self {
            fail_single: true,
            ..Self::new(model)
        }
    }

    pub fn single_count(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }

    pub fn batch_count(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let words = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>();
    let mut v = VOCAB
        .iter()
        .map(|term| words.iter().filter(|w| *w == term).count() as f32)
        .collect::<Vec<_>>();
    v.push(1.0);
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    v.iter().map(|x| x / norm).collect()
}

impl Embedder for KeywordEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn embed(&self, input: &str) -> Result<Vec<f32>, AppError> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_single {
            return Err(AppError::new("AI_EMBEDDINGS_FAILED", "embedding backend down").with_retryable(true));
        }
        Ok(keyword_vector(input))
    }

    fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(inputs.iter().map(|s| keyword_vector(s)).collect())
    }
}

/// Answers extraction and verification prompts with canned responses.
pub struct ScriptedLlm {
    extraction: Result<String, AppError>,
    verification: Result<String, AppError>,
    pub extraction_calls: AtomicUsize,
    pub verification_calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new(extraction: &str, verification: &str) -> Self {
        Self::with_results(Ok(extraction.to_string()), Ok(verification.to_string()))
    }

    pub fn with_results(extraction: Result<String, AppError>, verification: Result<String, AppError>) -> Self {
        Self {
            extraction,
            verification,
            extraction_calls: AtomicUsize::new(0),
            verification_calls: AtomicUsize::new(0),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.extraction_calls.load(Ordering::SeqCst) + self.verification_calls.load(Ordering::SeqCst)
    }
}

impl Llm for ScriptedLlm {
    fn generate(&self, _model: &str, prompt: &str) -> Result<String, AppError> {
        if prompt.contains("claim extraction assistant") {
            self.extraction_calls.fetch_add(1, Ordering::SeqCst);
            self.extraction.clone()
        } else {
            self.verification_calls.fetch_add(1, Ordering::SeqCst);
            self.verification.clone()
        }
    }
}

pub struct FixedClassifier {
    out: Result<ClassifierLabel, AppError>,
    pub calls: AtomicUsize,
}

impl FixedClassifier {
    pub fn label(label: &str, score: f64) -> Self {
        Self {
            out: Ok(ClassifierLabel {
                label: label.to_string(),
                score,
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            out: Err(AppError::new("AI_CLASSIFIER_FAILED", "classifier offline").with_retryable(true)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextClassifier for FixedClassifier {
    fn predict(&self, _text: &str) -> Result<ClassifierLabel, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.out.clone()
    }
}

pub struct Mocks {
    pub llm: Arc<ScriptedLlm>,
    pub embedder: Arc<KeywordEmbedder>,
    pub classifier: Arc<FixedClassifier>,
}

impl Mocks {
    pub fn new(llm: ScriptedLlm, embedder: KeywordEmbedder, classifier: FixedClassifier) -> Self {
        Self {
            llm: Arc::new(llm),
            embedder: Arc::new(embedder),
            classifier: Arc::new(classifier),
        }
    }

    pub fn providers(&self) -> Providers {
        Providers {
            llm: self.llm.clone(),
            embedder: self.embedder.clone(),
            classifier: self.classifier.clone(),
        }
    }
}

pub const TRUE_VERDICT: &str =
    "<think>The evidence matches.</think>\n{\"verdict\": \"True\", \"reasoning\": \"A verified statement says the same.\"}";

//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `FACTCHECK_*` environment variables.

#[cfg(test)]
mod tests;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

/// Process-wide settings, constructed once at startup and passed by reference into
/// every component constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Verified-statement corpus read by the indexing step.
    pub corpus_csv_path: PathBuf,
    /// SQLite file holding the embedded corpus.
    pub store_path: PathBuf,
    /// Named collection inside the store.
    pub collection_name: String,

    pub ollama_base_url: String,
    pub embedding_model: String,
    pub extraction_model: String,
    pub verification_model: String,

    /// Base URL of the text-classification server scoring claim-worthiness.
    pub classifier_url: String,
    /// Classifier label that marks a check-worthy factual statement.
    pub worthy_label: String,

    /// Number of nearest statements retrieved per claim. Valid range `1..=50`.
    pub top_k: usize,
    pub embed_batch_size: usize,

    pub llm_timeout: Duration,
    pub embed_timeout: Duration,
    pub classifier_timeout: Duration,
    /// SQLite busy timeout for store operations.
    pub store_timeout: Duration,

    /// Run one pipeline pass during startup before reporting ready.
    pub warmup_on_start: bool,
}

pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
pub const MAX_TOP_K: usize = 50;

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            corpus_csv_path: PathBuf::from("artifacts/verified_facts.csv"),
            store_path: PathBuf::from("artifacts/factstore.sqlite"),
            collection_name: "verified_facts".to_string(),
            ollama_base_url: DEFAULT_OLLAMA_URL.to_string(),
            embedding_model: "qwen3-embedding:0.6b".to_string(),
            extraction_model: "gemma:7b".to_string(),
            verification_model: "deepseek-r1:7b".to_string(),
            classifier_url: "http://127.0.0.1:8081".to_string(),
            worthy_label: "CFS".to_string(),
            top_k: 3,
            embed_batch_size: 32,
            llm_timeout: Duration::from_secs(300),
            embed_timeout: Duration::from_secs(30),
            classifier_timeout: Duration::from_secs(30),
            store_timeout: Duration::from_secs(5),
            warmup_on_start: true,
        }
    }
}

impl AppConfig {
    const ENV_CORPUS_CSV: &'static str = "FACTCHECK_CORPUS_CSV";
    const ENV_STORE_PATH: &'static str = "FACTCHECK_STORE_PATH";
    const ENV_COLLECTION: &'static str = "FACTCHECK_COLLECTION";
    const ENV_OLLAMA_URL: &'static str = "FACTCHECK_OLLAMA_URL";
    const ENV_EMBEDDING_MODEL: &'static str = "FACTCHECK_EMBEDDING_MODEL";
    const ENV_EXTRACTION_MODEL: &'static str = "FACTCHECK_EXTRACTION_MODEL";
    const ENV_VERIFICATION_MODEL: &'static str = "FACTCHECK_VERIFICATION_MODEL";
    const ENV_CLASSIFIER_URL: &'static str = "FACTCHECK_CLASSIFIER_URL";
    const ENV_WORTHY_LABEL: &'static str = "FACTCHECK_WORTHY_LABEL";
    const ENV_TOP_K: &'static str = "FACTCHECK_TOP_K";
    const ENV_EMBED_BATCH: &'static str = "FACTCHECK_EMBED_BATCH";
    const ENV_LLM_TIMEOUT: &'static str = "FACTCHECK_LLM_TIMEOUT_SECS";
    const ENV_EMBED_TIMEOUT: &'static str = "FACTCHECK_EMBED_TIMEOUT_SECS";
    const ENV_CLASSIFIER_TIMEOUT: &'static str = "FACTCHECK_CLASSIFIER_TIMEOUT_SECS";
    const ENV_STORE_TIMEOUT: &'static str = "FACTCHECK_STORE_TIMEOUT_SECS";
    const ENV_WARMUP: &'static str = "FACTCHECK_WARMUP";

    /// Loads configuration from the process environment (falling back to defaults).
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup. Blank values count as unset.
    pub fn from_vars<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let d = Self::default();

        Ok(Self {
            corpus_csv_path: get(Self::ENV_CORPUS_CSV).map(PathBuf::from).unwrap_or(d.corpus_csv_path),
            store_path: get(Self::ENV_STORE_PATH).map(PathBuf::from).unwrap_or(d.store_path),
            collection_name: get(Self::ENV_COLLECTION).unwrap_or(d.collection_name),
            ollama_base_url: get(Self::ENV_OLLAMA_URL).unwrap_or(d.ollama_base_url),
            embedding_model: get(Self::ENV_EMBEDDING_MODEL).unwrap_or(d.embedding_model),
            extraction_model: get(Self::ENV_EXTRACTION_MODEL).unwrap_or(d.extraction_model),
            verification_model: get(Self::ENV_VERIFICATION_MODEL).unwrap_or(d.verification_model),
            classifier_url: get(Self::ENV_CLASSIFIER_URL).unwrap_or(d.classifier_url),
            worthy_label: get(Self::ENV_WORTHY_LABEL).unwrap_or(d.worthy_label),
            top_k: parse_number(Self::ENV_TOP_K, get(Self::ENV_TOP_K), d.top_k)?,
            embed_batch_size: parse_number(
                Self::ENV_EMBED_BATCH,
                get(Self::ENV_EMBED_BATCH),
                d.embed_batch_size,
            )?,
            llm_timeout: parse_secs(Self::ENV_LLM_TIMEOUT, get(Self::ENV_LLM_TIMEOUT), d.llm_timeout)?,
            embed_timeout: parse_secs(
                Self::ENV_EMBED_TIMEOUT,
                get(Self::ENV_EMBED_TIMEOUT),
                d.embed_timeout,
            )?,
            classifier_timeout: parse_secs(
                Self::ENV_CLASSIFIER_TIMEOUT,
                get(Self::ENV_CLASSIFIER_TIMEOUT),
                d.classifier_timeout,
            )?,
            store_timeout: parse_secs(
                Self::ENV_STORE_TIMEOUT,
                get(Self::ENV_STORE_TIMEOUT),
                d.store_timeout,
            )?,
            warmup_on_start: parse_bool(Self::ENV_WARMUP, get(Self::ENV_WARMUP), d.warmup_on_start)?,
        })
    }

    /// Checks basic invariants. Does not touch the filesystem or the network.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.top_k == 0 || self.top_k > MAX_TOP_K {
            return Err(invalid("top_k must be within 1..=50")
                .with_details(format!("top_k={}", self.top_k)));
        }
        if self.embed_batch_size == 0 {
            return Err(invalid("embed_batch_size must be at least 1"));
        }
        if self.collection_name.is_empty()
            || !self
                .collection_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid("collection_name must be non-empty [A-Za-z0-9_-]")
                .with_details(format!("collection_name={}", self.collection_name)));
        }
        for (name, model) in [
            ("embedding_model", &self.embedding_model),
            ("extraction_model", &self.extraction_model),
            ("verification_model", &self.verification_model),
        ] {
            if model.trim().is_empty() {
                return Err(invalid(format!("{name} must not be empty")));
            }
        }
        for (name, timeout) in [
            ("llm_timeout", self.llm_timeout),
            ("embed_timeout", self.embed_timeout),
            ("classifier_timeout", self.classifier_timeout),
            ("store_timeout", self.store_timeout),
        ] {
            if timeout.is_zero() {
                return Err(invalid(format!("{name} must be greater than zero")));
            }
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::new("CONFIG_INVALID", message)
}

fn parse_number(key: &str, raw: Option<String>, default: usize) -> Result<usize, AppError> {
    match raw {
        Some(v) => v
            .parse::<usize>()
            .map_err(|e| invalid(format!("{key} is not a number")).with_details(format!("value={v}; err={e}"))),
        None => Ok(default),
    }
}

fn parse_secs(key: &str, raw: Option<String>, default: Duration) -> Result<Duration, AppError> {
    match raw {
        Some(v) => v
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| invalid(format!("{key} is not a number of seconds")).with_details(format!("value={v}; err={e}"))),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, raw: Option<String>, default: bool) -> Result<bool, AppError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(invalid(format!("{key} is not a boolean")).with_details(format!("value={other}"))),
    }
}

//! Claim-worthiness detection.
//!
//! The backend returns a raw `(label, score)`. [`ClaimWorthinessClassifier`] applies the
//! policy on top: a check-worthy label OR a score above [`WORTHY_SCORE_THRESHOLD`] marks the
//! input worthy, and backend failures default to worthy instead of rejecting the input.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vf_core::error::AppError;

pub mod http_classifier;

pub use http_classifier::HttpTextClassifier;

pub const WORTHY_SCORE_THRESHOLD: f64 = 0.5;
pub const DEFAULT_SCORE_ON_ERROR: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierLabel {
    pub label: String,
    pub score: f64,
}

/// Single-label text classification backend.
pub trait TextClassifier: Send + Sync {
    fn predict(&self, text: &str) -> Result<ClassifierLabel, AppError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionOutcome {
    Classified { label: String },
    DefaultedOnError { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub is_claim_worthy: bool,
    /// Always within `[0, 1]`.
    pub score: f64,
    pub outcome: DetectionOutcome,
}

#[derive(Clone)]
pub struct ClaimWorthinessClassifier {
    backend: Arc<dyn TextClassifier>,
    worthy_label: String,
}

impl ClaimWorthinessClassifier {
    pub fn new(backend: Arc<dyn TextClassifier>, worthy_label: impl Into<String>) -> Self {
        Self {
            backend,
            worthy_label: worthy_label.into(),
        }
    }

    pub fn classify(&self, text: &str) -> Detection {
        match self.backend.predict(text).and_then(check_score) {
            Ok(out) => {
                let label_worthy = !self.worthy_label.is_empty()
                    && out
                        .label
                        .to_ascii_uppercase()
                        .contains(&self.worthy_label.to_ascii_uppercase());
                let is_claim_worthy = label_worthy || out.score > WORTHY_SCORE_THRESHOLD;
                tracing::info!(
                    label = %out.label,
                    score = out.score,
                    is_claim_worthy,
                    "claim detection"
                );
                Detection {
                    is_claim_worthy,
                    score: out.score,
                    outcome: DetectionOutcome::Classified { label: out.label },
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "claim classifier unavailable; defaulting to worthy");
                Detection {
                    is_claim_worthy: true,
                    score: DEFAULT_SCORE_ON_ERROR,
                    outcome: DetectionOutcome::DefaultedOnError {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }
}

fn check_score(out: ClassifierLabel) -> Result<ClassifierLabel, AppError> {
    if !out.score.is_finite() || !(0.0..=1.0).contains(&out.score) {
        return Err(AppError::new(
            "AI_CLASSIFIER_FAILED",
            "Classifier score outside [0, 1]",
        )
        .with_details(format!("label={}; score={}", out.label, out.score)));
    }
    Ok(out)
}

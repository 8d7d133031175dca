use std::time::Duration;

use serde::Deserialize;
use vf_core::error::AppError;

use super::{ClassifierLabel, TextClassifier};
use crate::transport::{post_json, Endpoint};

/// Client for a text-classification inference server exposing `POST /predict`
/// with `{"inputs": "..."}`.
#[derive(Debug, Clone)]
pub struct HttpTextClassifier {
    endpoint: Endpoint,
    timeout: Duration,
}

impl HttpTextClassifier {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            endpoint: Endpoint::parse(base_url)?,
            timeout,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PredictResponse {
    Flat(Vec<ClassifierLabel>),
    Nested(Vec<Vec<ClassifierLabel>>),
}

impl PredictResponse {
    fn into_labels(self) -> Vec<ClassifierLabel> {
        match self {
            PredictResponse::Flat(v) => v,
            PredictResponse::Nested(v) => v.into_iter().next().unwrap_or_default(),
        }
    }
}

/// Highest-scoring label; `None` when the server returned nothing.
fn top_label(labels: Vec<ClassifierLabel>) -> Option<ClassifierLabel> {
    labels.into_iter().fold(None, |best, l| match best {
        Some(b) if b.score >= l.score => Some(b),
        _ => Some(l),
    })
}

impl TextClassifier for HttpTextClassifier {
    fn predict(&self, text: &str) -> Result<ClassifierLabel, AppError> {
        let url = self.endpoint.join("/predict");
        let body = serde_json::json!({ "inputs": text, "truncate": true });
        let resp: PredictResponse =
            post_json(&url, body, self.timeout, "AI_CLASSIFIER_FAILED", "classifier")?;

        top_label(resp.into_labels()).ok_or_else(|| {
            AppError::new("AI_CLASSIFIER_FAILED", "Classifier returned no labels")
                .with_details(format!("url={url}"))
        })
    }
}

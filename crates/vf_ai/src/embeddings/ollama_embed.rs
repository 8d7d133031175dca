use std::time::Duration;

use serde::{Deserialize, Serialize};
use vf_core::error::AppError;

use super::Embedder;
use crate::ollama::OllamaClient;
use crate::transport::{post_json, snippet};

const MAX_INPUT_BYTES: usize = 12_000;

#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
    timeout: Duration,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            model: model.into(),
            timeout,
        }
    }

    fn request(&self, input: EmbedInput<'_>, expected: usize) -> Result<Vec<Vec<f32>>, AppError> {
        let url = self.client.url("/api/embed");
        let req = EmbedRequest {
            model: &self.model,
            input,
        };
        let body = serde_json::to_value(req).map_err(|e| {
            AppError::new("AI_EMBEDDINGS_FAILED", "Failed to encode embeddings request")
                .with_details(e.to_string())
        })?;

        let v: EmbedResponse =
            post_json(&url, body, self.timeout, "AI_EMBEDDINGS_FAILED", "embeddings")?;

        if v.embeddings.len() != expected {
            return Err(AppError::new(
                "AI_EMBEDDINGS_FAILED",
                "Embeddings response length does not match input",
            )
            .with_details(format!("expected={expected}; got={}", v.embeddings.len())));
        }
        if v.embeddings.iter().any(|e| e.is_empty()) {
            return Err(AppError::new(
                "AI_EMBEDDINGS_FAILED",
                "Embeddings response was empty",
            ));
        }
        Ok(v.embeddings)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum EmbedInput<'a> {
    One(&'a str),
    Many(Vec<&'a str>),
}

#[derive(Debug, Clone, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: EmbedInput<'a>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl Embedder for OllamaEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    fn embed(&self, input: &str) -> Result<Vec<f32>, AppError> {
        // Keep requests bounded.
        let prompt = snippet(input, MAX_INPUT_BYTES);
        let mut out = self.request(EmbedInput::One(prompt), 1)?;
        Ok(out.remove(0))
    }

    fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let batch = inputs
            .iter()
            .map(|s| snippet(s, MAX_INPUT_BYTES))
            .collect::<Vec<_>>();
        self.request(EmbedInput::Many(batch), inputs.len())
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};
use vf_core::error::AppError;

use super::Llm;
use crate::ollama::OllamaClient;
use crate::transport::post_json;

#[derive(Debug, Clone)]
pub struct OllamaLlm {
    client: OllamaClient,
    timeout: Duration,
}

impl OllamaLlm {
    pub fn new(client: OllamaClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl Llm for OllamaLlm {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AppError> {
        let url = self.client.url("/api/generate");
        let req = GenerateRequest {
            model,
            prompt,
            stream: false,
        };
        let body = serde_json::to_value(req).map_err(|e| {
            AppError::new("AI_LLM_FAILED", "Failed to encode generate request")
                .with_details(e.to_string())
        })?;

        let started = std::time::Instant::now();
        let v: GenerateResponse = post_json(&url, body, self.timeout, "AI_LLM_FAILED", "generate")?;
        tracing::debug!(
            model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            chars = v.response.len(),
            "ollama generate finished"
        );

        if v.response.trim().is_empty() {
            return Err(AppError::new("AI_LLM_FAILED", "Generate response was empty")
                .with_details(format!("model={model}")));
        }
        Ok(v.response)
    }
}

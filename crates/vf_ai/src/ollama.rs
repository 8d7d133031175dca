use std::time::Duration;

use vf_core::error::AppError;

use crate::transport::Endpoint;

#[derive(Debug, Clone)]
pub struct OllamaClient {
    endpoint: Endpoint,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        Ok(Self {
            endpoint: Endpoint::parse(base_url)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.endpoint.as_str()
    }

    pub(crate) fn url(&self, path: &str) -> String {
        self.endpoint.join(path)
    }

    pub fn health_check(&self) -> Result<(), AppError> {
        let url = self.url("/api/tags");
        let resp = ureq::get(&url).timeout(Duration::from_millis(800)).call();

        match resp {
            Ok(r) if r.status() == 200 => Ok(()),
            Ok(r) => Err(
                AppError::new("AI_OLLAMA_UNHEALTHY", "Ollama health check failed")
                    .with_details(format!("status={}", r.status())),
            ),
            Err(ureq::Error::Status(status, _)) => Err(
                AppError::new("AI_OLLAMA_UNHEALTHY", "Ollama health check failed")
                    .with_details(format!("status={status}")),
            ),
            Err(e) => Err(AppError::new("AI_OLLAMA_UNREACHABLE", "Failed to reach Ollama")
                .with_details(format!("base_url={}; err={}", self.base_url(), e))
                .with_retryable(true)),
        }
    }
}

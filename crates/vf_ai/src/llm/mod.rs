use vf_core::error::AppError;

/// Text-in/text-out generation. Implementations enforce their own per-call timeout.
pub trait Llm: Send + Sync {
    fn generate(&self, model: &str, prompt: &str) -> Result<String, AppError>;
}

pub mod ollama_llm;

pub use ollama_llm::OllamaLlm;

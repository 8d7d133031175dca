use vf_core::error::AppError;

/// Maps text to a fixed-dimension vector.
///
/// The model identity is part of the store's schema: an index built with one `model()`
/// can only be queried with the same one.
pub trait Embedder: Send + Sync {
    fn model(&self) -> &str;

    fn embed(&self, input: &str) -> Result<Vec<f32>, AppError>;

    /// Same length and order as `inputs`.
    fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        inputs.iter().map(|text| self.embed(text)).collect()
    }
}

pub mod ollama_embed;

pub use ollama_embed::OllamaEmbedder;

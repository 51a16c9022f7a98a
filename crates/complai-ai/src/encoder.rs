//! The encoding seam the pipeline depends on.

use thiserror::Error;

/// Errors emitted while generating an embedding.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("tokenizer error: {0}")]
    Tokenize(String),

    #[cfg(feature = "onnx")]
    #[error("onnx runtime error: {0}")]
    Runtime(#[from] ort::Error),

    #[error("unexpected model output shape: {0}")]
    OutputShape(String),

    #[error("{0}")]
    Other(String),
}

/// Maps text to a fixed-length dense vector for similarity search.
///
/// Implementations must be deterministic for identical input and safe to
/// share across concurrently running jobs.
pub trait TextEncoder: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EncodeError>;

    /// Embedding dimensionality.
    fn dim(&self) -> usize;
}

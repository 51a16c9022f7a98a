//! AI inference layer: sentence embeddings for similarity search and the
//! coarse complaint classifier that feeds hybrid retrieval.

pub mod classifier;
pub mod encoder;

#[cfg(feature = "onnx")]
mod embedder;

pub use classifier::{Classifier, KeywordClassifier};
#[cfg(feature = "onnx")]
pub use embedder::{Embedder, SharedEmbedder};
pub use encoder::{EncodeError, TextEncoder};

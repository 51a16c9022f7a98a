//! ONNX Runtime embedding pipeline for sentence-transformers models.
//!
//! Produces mean-pooled, L2-normalised embeddings from all-MiniLM-L6-v2
//! (384 dimensions). The model directory must contain `model.onnx` and
//! `tokenizer.json`. The session is expensive to build, so one instance is
//! constructed at process startup and shared between jobs via
//! [`SharedEmbedder`].

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::info;

use crate::encoder::{EncodeError, TextEncoder};

/// MiniLM's maximum sequence length; longer inputs are truncated.
const MAX_TOKENS: usize = 256;

/// Sentence embedding generator using ONNX Runtime.
pub struct Embedder {
    session: Session,
    tokenizer: Tokenizer,
    dim: usize,
}

impl Embedder {
    /// Load an embedding model from a directory containing `model.onnx` and
    /// `tokenizer.json`.
    ///
    /// Load failure is a startup-time fatal error, never a per-job one.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );

        let session = Session::builder()?.commit_from_file(&model_path)?;
        let dim = infer_dim(session.outputs()[0].dtype()).unwrap_or(384);

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;
        tokenizer.with_padding(Some(tokenizers::PaddingParams {
            ..Default::default()
        }));

        info!(dim, model = %model_path.display(), "loaded embedding model");
        Ok(Self {
            session,
            tokenizer,
            dim,
        })
    }

    /// Embedding dimensionality (384 for all-MiniLM-L6-v2).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Embed a single text, returning a unit-length vector.
    pub fn embed(&mut self, text: &str) -> Result<Vec<f32>, EncodeError> {
        let mut vectors = self.embed_batch(&[text])?;
        vectors.pop().ok_or_else(|| {
            EncodeError::OutputShape("model returned no embedding for input".to_string())
        })
    }

    /// Embed a batch of texts, returning one unit-length vector per input.
    pub fn embed_batch(&mut self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EncodeError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let rows = texts.len();
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EncodeError::Tokenize(e.to_string()))?;
        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        // Flatten token ids, attention mask and type ids into [rows, seq_len].
        let mut input_ids = vec![0i64; rows * seq_len];
        let mut attention_mask = vec![0i64; rows * seq_len];
        let mut token_type_ids = vec![0i64; rows * seq_len];
        for (row, encoding) in encodings.iter().enumerate() {
            let base = row * seq_len;
            for (col, &id) in encoding.get_ids().iter().enumerate() {
                input_ids[base + col] = i64::from(id);
            }
            for (col, &mask) in encoding.get_attention_mask().iter().enumerate() {
                attention_mask[base + col] = i64::from(mask);
            }
            for (col, &tid) in encoding.get_type_ids().iter().enumerate() {
                token_type_ids[base + col] = i64::from(tid);
            }
        }

        let shape = [rows as i64, seq_len as i64];
        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, attention_mask.clone().into_boxed_slice()))?;
        let type_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs![
            "input_ids" => ids_tensor,
            "attention_mask" => mask_tensor,
            "token_type_ids" => type_tensor,
        ])?;

        // Token embeddings come back as [rows, seq_len, dim].
        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = output_shape;
        if dims.len() != 3 || dims[0] as usize != rows || dims[2] as usize != self.dim {
            return Err(EncodeError::OutputShape(format!(
                "got {dims:?}, expected [{rows}, {seq_len}, {}]",
                self.dim
            )));
        }
        let out_seq_len = dims[1] as usize;

        let mut vectors = Vec::with_capacity(rows);
        for row in 0..rows {
            vectors.push(mean_pool(
                output_data,
                &attention_mask[row * seq_len..row * seq_len + out_seq_len],
                row,
                out_seq_len,
                self.dim,
            ));
        }
        Ok(vectors)
    }
}

/// Attention-masked mean pooling over one row of token embeddings, followed
/// by L2 normalisation.
fn mean_pool(
    token_embeddings: &[f32],
    attention_mask: &[i64],
    row: usize,
    seq_len: usize,
    dim: usize,
) -> Vec<f32> {
    let mut pooled = vec![0.0f32; dim];
    let mut token_count = 0.0f32;

    for (col, &mask) in attention_mask.iter().enumerate().take(seq_len) {
        if mask == 0 {
            continue;
        }
        let start = (row * seq_len + col) * dim;
        for (acc, &val) in pooled.iter_mut().zip(&token_embeddings[start..start + dim]) {
            *acc += val;
        }
        token_count += 1.0;
    }

    if token_count > 0.0 {
        for v in &mut pooled {
            *v /= token_count;
        }
    }
    l2_normalize(&mut pooled);
    pooled
}

/// L2-normalize a vector in place.
fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Infer the embedding dimension from the ONNX model output type.
fn infer_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}

/// Process-wide shared embedder.
///
/// ort sessions need `&mut self` to run, so concurrent jobs serialise their
/// encode calls through a mutex around the single loaded instance.
#[derive(Clone)]
pub struct SharedEmbedder {
    inner: Arc<Mutex<Embedder>>,
    dim: usize,
}

impl SharedEmbedder {
    pub fn new(embedder: Embedder) -> Self {
        let dim = embedder.dim();
        Self {
            inner: Arc::new(Mutex::new(embedder)),
            dim,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Embedder>, EncodeError> {
        self.inner
            .lock()
            .map_err(|_| EncodeError::Other("embedder mutex poisoned".to_string()))
    }
}

impl TextEncoder for SharedEmbedder {
    fn encode(&self, text: &str) -> Result<Vec<f32>, EncodeError> {
        self.lock()?.embed(text)
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

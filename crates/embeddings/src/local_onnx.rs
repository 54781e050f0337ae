use crate::error::{EmbeddingError, Result};
use crate::provider::{l2_normalize, EmbeddingProvider, MAX_BATCH_SIZE};
use async_trait::async_trait;
use ndarray::{Array, Axis, Ix2, Ix3};
use ort::session::{builder::GraphOptimizationLevel, Session, SessionInputs};
use ort::value::{DynTensor, Tensor};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokenizers::{Encoding, PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tokio::task::spawn_blocking;

/// `ONNX_PATH` (spec.md §6) overrides the directory a local model is loaded
/// from; falls back to the platform config dir the way the teacher's
/// `model_dir()` does for its own `CONTEXT_FINDER_MODEL_DIR`.
pub const ONNX_PATH_ENV: &str = "ONNX_PATH";

pub struct LocalOnnxConfig {
    pub model_id: String,
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
    pub dimension: usize,
    pub max_sequence_length: usize,
}

impl LocalOnnxConfig {
    pub fn resolve_model_dir(override_path: Option<&Path>) -> PathBuf {
        if let Some(p) = override_path {
            return p.to_path_buf();
        }
        if let Ok(env_path) = std::env::var(ONNX_PATH_ENV) {
            return PathBuf::from(env_path);
        }
        dirs_next_config_dir().join("contextd").join("models")
    }
}

fn dirs_next_config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            std::env::var("HOME")
                .map(|h| PathBuf::from(h).join(".config"))
                .unwrap_or_else(|_| PathBuf::from("."))
        })
}

struct Inner {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    model_id: String,
    dimension: usize,
    max_length: usize,
}

/// Local embedding provider backed by an ONNX Runtime session. A single
/// session is loaded once and shared; inference is CPU-bound and run on a
/// blocking thread so it never stalls the async executor (§5).
#[derive(Clone)]
pub struct LocalOnnxProvider {
    inner: Arc<Inner>,
}

impl LocalOnnxProvider {
    pub fn load(config: LocalOnnxConfig) -> Result<Self> {
        if !config.model_path.exists() || !config.tokenizer_path.exists() {
            return Err(EmbeddingError::Provider(format!(
                "model files for '{}' are missing (expected ONNX at {} and tokenizer at {}); run `contextd init` to install the embedding runtime",
                config.model_id,
                config.model_path.display(),
                config.tokenizer_path.display(),
            )));
        }

        if !tokenizers::utils::parallelism::is_parallelism_configured() {
            tokenizers::utils::parallelism::set_parallelism(false);
        }

        let mut tokenizer = Tokenizer::from_file(&config.tokenizer_path)
            .map_err(|e| EmbeddingError::Provider(format!("tokenizer load failed: {e}")))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..PaddingParams::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_sequence_length,
                ..TruncationParams::default()
            }))
            .map_err(|e| EmbeddingError::Provider(format!("tokenizer truncation failed: {e}")))?;

        let (intra_threads, inter_threads) = default_ort_threads();
        let session = Session::builder()
            .map_err(|e| EmbeddingError::Provider(e.to_string()))?
            .with_intra_threads(intra_threads)
            .map_err(|e| EmbeddingError::Provider(e.to_string()))?
            .with_inter_threads(inter_threads)
            .map_err(|e| EmbeddingError::Provider(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| EmbeddingError::Provider(e.to_string()))?
            .commit_from_file(&config.model_path)
            .map_err(|e| EmbeddingError::Provider(format!("failed to load ONNX model: {e}")))?;

        log::info!(
            "loaded local embedding model '{}' (dim {}, max_length {})",
            config.model_id,
            config.dimension,
            config.max_sequence_length
        );

        Ok(Self {
            inner: Arc::new(Inner {
                session: Mutex::new(session),
                tokenizer,
                model_id: config.model_id,
                dimension: config.dimension,
                max_length: config.max_sequence_length,
            }),
        })
    }
}

impl Inner {
    fn embed_batch_blocking(&self, texts: &[String], dimension: usize) -> Result<Vec<Vec<f32>>> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::Provider(format!("tokenization failed: {e}")))?;
        if encodings.is_empty() {
            return Ok(vec![]);
        }

        let seq_len = encodings[0].len();
        if seq_len > self.max_length {
            return Err(EmbeddingError::Provider(format!(
                "tokenized length {seq_len} exceeds max_length {}",
                self.max_length
            )));
        }

        let (ids, masks, type_ids, mask_rows) = build_flat_tensors(&encodings, seq_len);
        let shape = (texts.len(), seq_len);

        let ids_array = Array::from_shape_vec(shape, ids)
            .map_err(|e| EmbeddingError::Provider(format!("ids shape error: {e}")))?;
        let mask_array = Array::from_shape_vec(shape, masks)
            .map_err(|e| EmbeddingError::Provider(format!("mask shape error: {e}")))?;
        let type_array = Array::from_shape_vec(shape, type_ids)
            .map_err(|e| EmbeddingError::Provider(format!("type ids shape error: {e}")))?;

        let ids_tensor = Tensor::from_array(ids_array.into_dyn())
            .map_err(|e| EmbeddingError::Provider(e.to_string()))?
            .upcast();
        let mask_tensor = Tensor::from_array(mask_array.into_dyn())
            .map_err(|e| EmbeddingError::Provider(e.to_string()))?
            .upcast();
        let type_tensor = Tensor::from_array(type_array.into_dyn())
            .map_err(|e| EmbeddingError::Provider(e.to_string()))?
            .upcast();

        let array = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| EmbeddingError::Provider("failed to lock ONNX session".into()))?;

            let mut feed: HashMap<String, DynTensor> = HashMap::new();
            feed.insert("input_ids".to_string(), ids_tensor);
            feed.insert("attention_mask".to_string(), mask_tensor);
            feed.insert("token_type_ids".to_string(), type_tensor);

            let outputs = session
                .run(SessionInputs::from(feed))
                .map_err(|e| EmbeddingError::Provider(format!("ONNX forward failed: {e}")))?;
            if outputs.len() == 0 {
                return Err(EmbeddingError::Provider("ONNX returned no outputs".into()));
            }
            outputs[0]
                .try_extract_array::<f32>()
                .map_err(|e| EmbeddingError::Provider(format!("failed to decode output: {e}")))?
                .to_owned()
        };

        embeddings_from_output(array, &mask_rows, dimension)
    }
}

#[async_trait]
impl EmbeddingProvider for LocalOnnxProvider {
    fn dimension(&self) -> usize {
        self.inner.dimension
    }

    fn model_id(&self) -> &str {
        &self.inner.model_id
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(MAX_BATCH_SIZE) {
            let chunk = chunk.to_vec();
            let dimension = self.inner.dimension;
            let inner = self.inner.clone();
            let embedded = spawn_blocking(move || inner.embed_batch_blocking(&chunk, dimension))
                .await
                .map_err(|e| EmbeddingError::Provider(format!("join error: {e}")))??;
            out.extend(embedded);
        }
        Ok(out)
    }
}

fn default_ort_threads() -> (usize, usize) {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let intra = if cpus <= 4 {
        1
    } else if cpus <= 12 {
        2
    } else {
        4
    };
    (intra, 1)
}

fn build_flat_tensors(
    encodings: &[Encoding],
    seq_len: usize,
) -> (Vec<i64>, Vec<i64>, Vec<i64>, Vec<Vec<i64>>) {
    let mut ids = Vec::with_capacity(encodings.len() * seq_len);
    let mut masks = Vec::with_capacity(encodings.len() * seq_len);
    let mut type_ids = Vec::with_capacity(encodings.len() * seq_len);
    let mut mask_rows = Vec::with_capacity(encodings.len());

    for encoding in encodings {
        let e_ids = encoding.get_ids();
        let e_masks = encoding.get_attention_mask();
        let e_types = encoding.get_type_ids();
        for idx in 0..seq_len {
            ids.push(i64::from(*e_ids.get(idx).unwrap_or(&0)));
            masks.push(i64::from(*e_masks.get(idx).unwrap_or(&0)));
            type_ids.push(i64::from(*e_types.get(idx).unwrap_or(&0)));
        }
        mask_rows.push(e_masks.iter().take(seq_len).map(|v| i64::from(*v)).collect());
    }
    (ids, masks, type_ids, mask_rows)
}

fn embeddings_from_output(
    array: ndarray::ArrayD<f32>,
    mask_rows: &[Vec<i64>],
    expected_dimension: usize,
) -> Result<Vec<Vec<f32>>> {
    let mut out = Vec::new();
    match array.ndim() {
        2 => {
            let embeddings = array
                .into_dimensionality::<Ix2>()
                .map_err(|e| EmbeddingError::Provider(format!("bad output shape: {e}")))?;
            for row in embeddings.outer_iter() {
                let mut emb = row.to_owned().to_vec();
                ensure_dimension(&emb, expected_dimension)?;
                l2_normalize(&mut emb);
                out.push(emb);
            }
        }
        3 => {
            let hidden = array
                .into_dimensionality::<Ix3>()
                .map_err(|e| EmbeddingError::Provider(format!("bad output shape: {e}")))?;
            for (idx, sample) in hidden.outer_iter().enumerate() {
                let attn = mask_rows
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| vec![1; sample.len_of(Axis(0))]);
                let mut emb = mean_pool(sample.view(), &attn);
                ensure_dimension(&emb, expected_dimension)?;
                l2_normalize(&mut emb);
                out.push(std::mem::take(&mut emb));
            }
        }
        other => {
            return Err(EmbeddingError::Provider(format!(
                "unexpected ONNX output rank: {other}"
            )));
        }
    }
    Ok(out)
}

fn mean_pool(sample: ndarray::ArrayView2<'_, f32>, mask: &[i64]) -> Vec<f32> {
    if sample.is_empty() {
        return vec![];
    }
    let hidden = sample.len_of(Axis(1));
    let mut sum = vec![0.0f32; hidden];
    let mut count = 0.0f32;
    for (token_idx, token) in sample.outer_iter().enumerate() {
        if *mask.get(token_idx).unwrap_or(&0) == 0 {
            continue;
        }
        count += 1.0;
        for (dim, value) in token.iter().enumerate() {
            sum[dim] += value;
        }
    }
    if count > 0.0 {
        for value in &mut sum {
            *value /= count;
        }
    }
    sum
}

fn ensure_dimension(vec: &[f32], expected: usize) -> Result<()> {
    if vec.len() != expected {
        return Err(EmbeddingError::InvalidDimension {
            expected,
            actual: vec.len(),
        });
    }
    Ok(())
}

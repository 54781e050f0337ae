//! Pluggable text-to-vector embedding providers.
//!
//! [`EmbeddingProvider`] is the capability trait every caller programs
//! against; [`LocalOnnxProvider`] and [`RemoteHttpProvider`] are the two
//! tagged implementations selected at startup from config (§9 "Polymorphism
//! over providers" — no runtime discovery by reflection), and [`StubProvider`]
//! is a deterministic, model-free implementation for tests.

mod error;
mod local_onnx;
mod provider;
mod remote_http;
mod stub;

pub use error::{EmbeddingError, Result};
pub use local_onnx::{LocalOnnxConfig, LocalOnnxProvider, ONNX_PATH_ENV};
pub use provider::{cosine_similarity, EmbeddingProvider, MAX_BATCH_SIZE};
pub use remote_http::RemoteHttpProvider;
pub use stub::StubProvider;

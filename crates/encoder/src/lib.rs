//! Encoder seam for StyleSearch.
//!
//! The embedding model is an external collaborator: the store and search code
//! only need "image in, unit vector out" and "text in, unit vector out". This
//! crate models that as the [`Encoder`] trait plus three implementations: a
//! deterministic hash encoder for tests and offline demos, a blocking HTTP
//! client for a real model sidecar, and a timeout wrapper that bounds every
//! call. Encoders are explicit handles passed into callers; there is no
//! process-wide model singleton.

mod bounded;
mod hash;
mod http;

pub use bounded::BoundedEncoder;
pub use hash::HashEncoder;
pub use http::HttpEncoder;

use std::io;
use std::path::Path;
use std::sync::Arc;

use core_types::Embedding;
use thiserror::Error;

/// Errors surfaced by encoder implementations.
#[derive(Debug, Error)]
pub enum EncoderError {
    /// The model rejected or failed to embed the input.
    #[error("encoding failed: {0}")]
    Failed(String),
    /// The bounded wait elapsed before the encoder produced a vector.
    #[error("encoder timed out after {waited_ms} ms")]
    Timeout { waited_ms: u64 },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// The sidecar answered with something that is not an embedding.
    #[error("invalid encoder response: {0}")]
    InvalidResponse(String),
}

/// Black-box embedding model.
///
/// Implementations must return unit-length vectors of [`Encoder::dimension`]
/// width; model choice, device placement, and tokenization live behind this
/// trait.
pub trait Encoder: Send + Sync {
    /// Embed an image file into a unit-length vector.
    fn encode_image(&self, path: &Path) -> Result<Embedding, EncoderError>;

    /// Embed a free-text query into a unit-length vector.
    fn encode_text(&self, text: &str) -> Result<Embedding, EncoderError>;

    /// Width of the vectors this encoder produces.
    fn dimension(&self) -> usize;
}

impl<E: Encoder + ?Sized> Encoder for Arc<E> {
    fn encode_image(&self, path: &Path) -> Result<Embedding, EncoderError> {
        (**self).encode_image(path)
    }

    fn encode_text(&self, text: &str) -> Result<Embedding, EncoderError> {
        (**self).encode_text(text)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }
}

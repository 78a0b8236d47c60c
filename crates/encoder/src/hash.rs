//! Deterministic model-free encoder.
//!
//! Components are derived by hashing the input bytes together with the
//! component index, so equal inputs always map to equal vectors and the
//! pipeline can run end-to-end without a model process. Geometric proximity
//! carries no semantic meaning here; that is fine for tests and demos.

use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;

use ahash::AHasher;
use core_types::Embedding;

use crate::{Encoder, EncoderError};

/// Hash-based stand-in for a real embedding model.
#[derive(Debug, Clone, Copy)]
pub struct HashEncoder {
    dimension: usize,
}

impl HashEncoder {
    /// Matches the ViT-B/32 CLIP embedding width.
    pub const DEFAULT_DIMENSION: usize = 512;

    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn pseudo_embedding(&self, bytes: &[u8]) -> Result<Embedding, EncoderError> {
        let mut data = Vec::with_capacity(self.dimension);
        for component in 0..self.dimension as u64 {
            // AHasher::default() uses fixed keys, so this is stable across
            // processes and runs.
            let mut hasher = AHasher::default();
            bytes.hash(&mut hasher);
            component.hash(&mut hasher);
            let raw = hasher.finish();
            // Map the hash onto [-1, 1).
            let unit = (raw as f64 / u64::MAX as f64) * 2.0 - 1.0;
            data.push(unit as f32);
        }
        Embedding::new(data)
            .and_then(Embedding::normalized)
            .map_err(|err| EncoderError::Failed(err.to_string()))
    }
}

impl Default for HashEncoder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSION)
    }
}

impl Encoder for HashEncoder {
    fn encode_image(&self, path: &Path) -> Result<Embedding, EncoderError> {
        let bytes = fs::read(path)?;
        self.pseudo_embedding(&bytes)
    }

    fn encode_text(&self, text: &str) -> Result<Embedding, EncoderError> {
        self.pseudo_embedding(text.as_bytes())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

//! Core vector types and shared lightweight types for StyleSearch.
//!
//! These types intentionally avoid heavy dependencies and aim to be
//! serialization-friendly for the JSON store format and IPC payloads.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;

/// Similarity score: the dot product of two unit vectors, in [-1, 1].
pub type Score = f32;

/// Tolerance for unit-length checks and round-trip comparisons.
pub const NORM_EPSILON: f32 = 1e-6;

/// Errors raised while constructing or normalizing an [`Embedding`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmbeddingError {
    #[error("embedding must not be empty")]
    Empty,
    #[error("non-finite value {value} at index {index}")]
    NonFinite { index: usize, value: f32 },
    #[error("cannot normalize a zero-length vector")]
    ZeroNorm,
}

/// A fixed-length `f32` vector produced by an encoder.
///
/// Construction rejects empty vectors and non-finite components. Callers that
/// need the cosine-as-dot-product equivalence must normalize first; the store
/// does so on every insert.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    data: Vec<f32>,
}

impl Embedding {
    /// Validate and wrap a raw vector.
    pub fn new(data: Vec<f32>) -> Result<Self, EmbeddingError> {
        if data.is_empty() {
            return Err(EmbeddingError::Empty);
        }
        for (index, &value) in data.iter().enumerate() {
            if !value.is_finite() {
                return Err(EmbeddingError::NonFinite { index, value });
            }
        }
        Ok(Self { data })
    }

    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }

    /// Euclidean length, accumulated in `f64` to keep the error well under
    /// [`NORM_EPSILON`] at CLIP-scale dimensionality.
    pub fn norm(&self) -> f32 {
        let sum: f64 = self.data.iter().map(|&v| f64::from(v) * f64::from(v)).sum();
        sum.sqrt() as f32
    }

    pub fn is_normalized(&self) -> bool {
        (self.norm() - 1.0).abs() <= NORM_EPSILON
    }

    /// Scale to unit length. Fails on the zero vector, which has no direction.
    pub fn normalized(self) -> Result<Self, EmbeddingError> {
        let sum: f64 = self.data.iter().map(|&v| f64::from(v) * f64::from(v)).sum();
        let norm = sum.sqrt();
        if norm <= f64::from(f32::EPSILON) {
            return Err(EmbeddingError::ZeroNorm);
        }
        let data = self
            .data
            .into_iter()
            .map(|v| (f64::from(v) / norm) as f32)
            .collect();
        Ok(Self { data })
    }

    /// Dot product. Equals cosine similarity when both sides are unit length.
    pub fn dot(&self, other: &Self) -> Score {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| f64::from(a) * f64::from(b))
            .sum::<f64>() as f32
    }
}

/// A single ranked result produced by a similarity query.
///
/// Serializes to the `{identifier, score}` shape the query endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub identifier: String,
    pub score: Score,
}

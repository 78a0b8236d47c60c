//! Cosine ranking over the store.

use core_types::{Embedding, SearchHit};
use encoder::Encoder;
use tracing::warn;

use crate::error::{Result, StoreError};
use crate::store::EmbeddingStore;

/// Rank every stored vector against `query` and return the top `k`.
///
/// The query is normalized before comparison, so scores are cosine
/// similarities. Results are sorted descending by score; the sort is stable,
/// so equal scores keep store insertion order. `k == 0` and an empty store
/// both yield an empty result set.
pub fn search(store: &EmbeddingStore, query: &Embedding, k: usize) -> Result<Vec<SearchHit>> {
    if k == 0 || store.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(expected) = store.dimension()
        && query.dimension() != expected
    {
        return Err(StoreError::DimensionMismatch {
            expected,
            actual: query.dimension(),
        });
    }
    let query = query
        .clone()
        .normalized()
        .map_err(StoreError::InvalidQuery)?;

    let mut hits: Vec<SearchHit> = store
        .iter()
        .map(|(identifier, embedding)| SearchHit {
            identifier: identifier.to_string(),
            score: query.dot(embedding),
        })
        .collect();
    // Unit vectors of finite components cannot produce NaN scores, so the
    // comparator's Equal fallback is unreachable in practice.
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits.truncate(k);
    Ok(hits)
}

/// Embed a free-text query and search the store with it.
///
/// Encoder failures degrade to an empty result set with the cause logged;
/// "nothing found" is safer for callers than a propagated fault.
pub fn search_text(
    store: &EmbeddingStore,
    encoder: &dyn Encoder,
    query: &str,
    k: usize,
) -> Result<Vec<SearchHit>> {
    let embedded = match encoder.encode_text(query) {
        Ok(embedding) => embedding,
        Err(err) => {
            warn!(query, error = %err, "query embedding failed; returning no results");
            return Ok(Vec::new());
        }
    };
    search(store, &embedded, k)
}

/// Rank entries against a stored reference entry, excluding the reference
/// itself from the results.
pub fn recommend(store: &EmbeddingStore, reference: &str, k: usize) -> Result<Vec<SearchHit>> {
    let query = store
        .get(reference)
        .ok_or_else(|| StoreError::UnknownIdentifier(reference.to_string()))?
        .clone();
    // Over-fetch by one: the reference itself ranks at (or tied for) the top.
    let hits = search(store, &query, k.saturating_add(1))?;
    Ok(hits
        .into_iter()
        .filter(|hit| hit.identifier != reference)
        .take(k)
        .collect())
}

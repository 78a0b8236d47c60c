//! Bulk directory embedding.

use std::fs;
use std::path::Path;

use encoder::Encoder;
use tracing::{info, warn};

use crate::error::Result;
use crate::store::EmbeddingStore;

/// Outcome of a bulk embedding pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub processed: usize,
    pub skipped: Vec<String>,
}

/// Embed every regular file in `dir` (sorted by filename) into a fresh store.
///
/// Per-item failures — unreadable files, encoder errors, rejected vectors —
/// are recorded in the report and skipped; one bad item never aborts the
/// batch. Sorted traversal makes the store's insertion order (and therefore
/// the search tie-break order) lexical by filename.
pub fn embed_directory(encoder: &dyn Encoder, dir: &Path) -> Result<(EmbeddingStore, BulkReport)> {
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    let mut store = EmbeddingStore::new();
    let mut report = BulkReport::default();
    for name in names {
        let path = dir.join(&name);
        match encoder.encode_image(&path) {
            Ok(embedding) => match store.insert(name.clone(), embedding.into_inner()) {
                Ok(()) => report.processed += 1,
                Err(err) => {
                    warn!(identifier = %name, error = %err, "rejected vector; skipping");
                    report.skipped.push(name);
                }
            },
            Err(err) => {
                warn!(identifier = %name, error = %err, "failed to embed; skipping");
                report.skipped.push(name);
            }
        }
    }
    info!(
        processed = report.processed,
        skipped = report.skipped.len(),
        "bulk embedding finished"
    );
    Ok((store, report))
}

/// Embed a directory and atomically persist the result, overwriting any
/// previous store at `store_path`.
pub fn embed_and_store(
    encoder: &dyn Encoder,
    dir: &Path,
    store_path: &Path,
) -> Result<(EmbeddingStore, BulkReport)> {
    let (store, report) = embed_directory(encoder, dir)?;
    store.save(store_path)?;
    Ok((store, report))
}

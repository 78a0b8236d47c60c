//! Durable identifier → embedding mapping with atomic persistence.
//!
//! Two on-disk shapes are accepted for backward compatibility with earlier
//! exports: a flat JSON object `{identifier: [floats]}` (the canonical write
//! format) and a JSON array of records, where records may use either
//! `{identifier, vector}` or the legacy `{filename, embedding}` field names.
//! The loader normalizes both into one in-memory form at the boundary.

use std::fs;
use std::path::{Path, PathBuf};

use core_types::Embedding;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Result, StoreError};

/// Record form kept readable for legacy exports.
#[derive(Debug, Deserialize)]
struct StoredRecord {
    #[serde(alias = "filename")]
    identifier: String,
    #[serde(alias = "embedding")]
    vector: Vec<f32>,
}

/// Raw shapes the loader accepts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredFormat {
    Map(IndexMap<String, Vec<f32>>),
    Records(Vec<StoredRecord>),
}

/// Insertion-ordered mapping from identifier to unit-length vector.
///
/// All vectors share one dimensionality, fixed by the first insert. Insertion
/// order is preserved and is the tie-break order for equal search scores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingStore {
    entries: IndexMap<String, Embedding>,
}

impl EmbeddingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shared vector width, or `None` while the store is empty.
    pub fn dimension(&self) -> Option<usize> {
        self.entries.values().next().map(Embedding::dimension)
    }

    pub fn get(&self, identifier: &str) -> Option<&Embedding> {
        self.entries.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Embedding)> {
        self.entries.iter().map(|(id, emb)| (id.as_str(), emb))
    }

    /// Validate, normalize, and insert a vector under `identifier`.
    ///
    /// Re-inserting an identifier replaces its vector in place, keeping the
    /// original position.
    pub fn insert(&mut self, identifier: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        let identifier = identifier.into();
        if let Some(expected) = self.dimension()
            && vector.len() != expected
        {
            return Err(StoreError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        let embedding = Embedding::new(vector)
            .and_then(Embedding::normalized)
            .map_err(|source| StoreError::InvalidVector {
                identifier: identifier.clone(),
                source,
            })?;
        self.entries.insert(identifier, embedding);
        Ok(())
    }

    /// Load a persisted store, accepting both on-disk shapes.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StoreError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = fs::read_to_string(path)?;
        let parsed: StoredFormat = serde_json::from_str(&raw)
            .map_err(|err| StoreError::Format(format!("{}: {err}", path.display())))?;

        let mut store = Self::new();
        match parsed {
            StoredFormat::Map(map) => {
                for (identifier, vector) in map {
                    store.insert(identifier, vector)?;
                }
            }
            StoredFormat::Records(records) => {
                for record in records {
                    store.insert(record.identifier, record.vector)?;
                }
            }
        }
        Ok(store)
    }

    /// Persist as flat-map JSON: write a sibling temp file, then rename into
    /// place so readers never observe a partial write.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let map: IndexMap<&str, &[f32]> = self
            .entries
            .iter()
            .map(|(id, emb)| (id.as_str(), emb.as_slice()))
            .collect();
        let json = serde_json::to_string(&map).map_err(|err| StoreError::Format(err.to_string()))?;

        let tmp = tmp_path(path);
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::NORM_EPSILON;
    use tempfile::tempdir;

    fn sample_store() -> EmbeddingStore {
        let mut store = EmbeddingStore::new();
        store.insert("page1.jpeg", vec![1.0, 0.0]).unwrap();
        store.insert("page2.jpeg", vec![0.0, 1.0]).unwrap();
        store.insert("page3.jpeg", vec![3.0, 4.0]).unwrap();
        store
    }

    fn assert_close(store: &EmbeddingStore, other: &EmbeddingStore) {
        assert_eq!(store.len(), other.len());
        for ((id_a, emb_a), (id_b, emb_b)) in store.iter().zip(other.iter()) {
            assert_eq!(id_a, id_b);
            for (a, b) in emb_a.as_slice().iter().zip(emb_b.as_slice()) {
                assert!((a - b).abs() <= NORM_EPSILON);
            }
        }
    }

    #[test]
    fn save_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = sample_store();
        store.save(&path).unwrap();
        let back = EmbeddingStore::load(&path).unwrap();
        assert_close(&store, &back);
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        sample_store().save(&path).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["store.json"]);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("static").join("store.json");
        sample_store().save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = EmbeddingStore::load(Path::new("/nonexistent/store.json")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn loads_record_list_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.json");
        fs::write(
            &path,
            r#"[{"identifier": "a.jpeg", "vector": [1.0, 0.0]},
                {"identifier": "b.jpeg", "vector": [0.0, 1.0]}]"#,
        )
        .unwrap();

        let store = EmbeddingStore::load(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.contains("a.jpeg"));
        assert!(store.contains("b.jpeg"));
    }

    #[test]
    fn loads_legacy_record_field_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        fs::write(
            &path,
            r#"[{"filename": "page7_10.jpeg", "embedding": [0.6, 0.8]}]"#,
        )
        .unwrap();

        let store = EmbeddingStore::load(&path).unwrap();
        assert!(store.contains("page7_10.jpeg"));
    }

    #[test]
    fn unsupported_top_level_is_a_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bogus.json");
        fs::write(&path, "42").unwrap();
        let err = EmbeddingStore::load(&path).unwrap_err();
        assert!(matches!(err, StoreError::Format(_)));

        fs::write(&path, "not json at all").unwrap();
        let err = EmbeddingStore::load(&path).unwrap_err();
        assert!(matches!(err, StoreError::Format(_)));
    }

    #[test]
    fn mixed_dimensions_are_rejected() {
        let mut store = EmbeddingStore::new();
        store.insert("a.jpeg", vec![1.0, 0.0]).unwrap();
        let err = store.insert("b.jpeg", vec![1.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn mixed_dimensions_on_disk_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mixed.json");
        fs::write(&path, r#"{"a.jpeg": [1.0, 0.0], "b.jpeg": [1.0]}"#).unwrap();
        let err = EmbeddingStore::load(&path).unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { .. }));
    }

    #[test]
    fn insert_normalizes_vectors() {
        let store = sample_store();
        let emb = store.get("page3.jpeg").unwrap();
        assert!(emb.is_normalized());
        assert!((emb.as_slice()[0] - 0.6).abs() <= NORM_EPSILON);
    }

    #[test]
    fn reinsert_keeps_position() {
        let mut store = sample_store();
        store.insert("page1.jpeg", vec![0.0, 2.0]).unwrap();
        let ids: Vec<_> = store.iter().map(|(id, _)| id.to_string()).collect();
        assert_eq!(ids, vec!["page1.jpeg", "page2.jpeg", "page3.jpeg"]);
    }

    #[test]
    fn load_preserves_file_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ordered.json");
        fs::write(&path, r#"{"z.jpeg": [1.0, 0.0], "a.jpeg": [0.0, 1.0]}"#).unwrap();

        let store = EmbeddingStore::load(&path).unwrap();
        let ids: Vec<_> = store.iter().map(|(id, _)| id.to_string()).collect();
        assert_eq!(ids, vec!["z.jpeg", "a.jpeg"]);
    }
}

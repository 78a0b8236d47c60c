//! Embedding store and cosine similarity search.
//!
//! The store is an insertion-ordered mapping from identifier (filename) to a
//! unit-length vector, persisted as flat-map JSON with atomic replace-on-disk.
//! Search ranks stored vectors against a query by dot product, descending;
//! equal scores keep store insertion order. Bulk embedding walks a directory
//! in sorted filename order and skips (never aborts on) per-item failures.

mod bulk;
mod error;
mod search;
mod shared;
mod store;

pub use bulk::{BulkReport, embed_and_store, embed_directory};
pub use error::{Result, StoreError};
pub use search::{recommend, search, search_text};
pub use shared::SharedIndex;
pub use store::EmbeddingStore;

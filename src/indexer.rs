//! Indexer - extracts metadata for every table in a store, embeds it and
//! upserts it into the vector index under a stable content-derived id.

use crate::embed::{retrieval_prompt, Embedder};
use crate::error::Result;
use crate::extract::extract_metadata;
use crate::metadata::{TableMetadata, TablePayload};
use crate::store::TableStore;
use crate::vector_index::VectorIndex;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};

/// Stable identifier for a table: the first 8 bytes of
/// SHA-256(table_name ":" source_file). Re-indexing a reordered or subsetted
/// file set never reassigns an id to a different table.
pub fn stable_table_id(table_name: &str, source_file: &str) -> u64 {
    let digest = Sha256::digest(format!("{}:{}", table_name, source_file).as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

/// Outcome of one indexing run. A failed table never aborts the run.
#[derive(Debug, Default)]
pub struct IndexReport {
    pub indexed: Vec<String>,
    pub failed: Vec<(String, String)>,
}

pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl Indexer {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Index every table in the store, in listing order. Per-table extraction
    /// or embedding failures are recorded and the run continues.
    pub async fn index_store(&self, store: &dyn TableStore) -> Result<IndexReport> {
        self.index
            .ensure_collection(self.embedder.dimension())
            .await?;

        let files = store.list()?;
        let total = files.len();
        let mut report = IndexReport::default();

        for (position, source_file) in files.iter().enumerate() {
            let outcome = async {
                let bytes = store.read(source_file)?;
                self.index_one(source_file, &bytes).await
            }
            .await;

            match outcome {
                Ok(meta) => {
                    info!(
                        table = %meta.table_name,
                        file = %source_file,
                        "indexed table ({}/{})",
                        position + 1,
                        total
                    );
                    report.indexed.push(source_file.clone());
                }
                Err(e) => {
                    warn!(file = %source_file, error = %e, "failed to index table, continuing");
                    report.failed.push((source_file.clone(), e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Extract, embed and upsert a single table.
    pub async fn index_one(&self, source_file: &str, bytes: &[u8]) -> Result<TableMetadata> {
        let meta = extract_metadata(source_file, bytes)?;
        let vector = self
            .embedder
            .embed(&retrieval_prompt(&meta.metadata_text))
            .await?;
        let id = stable_table_id(&meta.table_name, &meta.source_file);
        self.index
            .upsert(id, vector, TablePayload::from(&meta))
            .await?;
        Ok(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_ids_are_deterministic() {
        let a = stable_table_id("sales", "sales.csv");
        let b = stable_table_id("sales", "sales.csv");
        assert_eq!(a, b);
    }

    #[test]
    fn stable_ids_differ_per_table() {
        let a = stable_table_id("sales", "sales.csv");
        let b = stable_table_id("users", "users.csv");
        let c = stable_table_id("sales", "sales_2024.csv");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}

//! Table Router - embeds the question and retrieves the single best-matching
//! table's metadata from the vector index.

use crate::embed::{retrieval_prompt, Embedder};
use crate::error::Result;
use crate::metadata::TablePayload;
use crate::vector_index::VectorIndex;
use std::sync::Arc;
use tracing::info;

/// The best-matching table for one question. The score is a cosine
/// similarity in [0, 1]; higher is more similar, nothing more is guaranteed.
#[derive(Debug, Clone)]
pub struct RoutingResult {
    pub payload: TablePayload,
    pub score: Option<f32>,
}

pub struct TableRouter {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl TableRouter {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Top-1 retrieval only. Returns `None` when the index is empty or has
    /// no hits; close seconds are never surfaced.
    pub async fn route(&self, question: &str) -> Result<Option<RoutingResult>> {
        let vector = self.embedder.embed(&retrieval_prompt(question)).await?;
        let hits = self.index.search(&vector, 1).await?;

        Ok(hits.into_iter().next().map(|hit| {
            info!(
                table = %hit.payload.table_name,
                score = ?hit.score,
                "routed question to table"
            );
            RoutingResult {
                payload: hit.payload,
                score: hit.score,
            }
        }))
    }
}

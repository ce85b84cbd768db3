//! Vector index abstraction and the in-memory cosine-similarity
//! implementation used for tests and single-process deployments.

use crate::error::{ChatError, Result};
use crate::metadata::TablePayload;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Collection holding one entry per indexed table.
pub const COLLECTION_NAME: &str = "table_metadata";

/// One search hit: the stored payload plus a similarity score, best-first.
#[derive(Debug, Clone)]
pub struct ScoredPayload {
    pub payload: TablePayload,
    pub score: Option<f32>,
}

/// Opaque nearest-neighbor store. Writers must serialize; reads may run
/// concurrently. Similarity is cosine over normalized vectors.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create the backing collection if absent, with the given dimensionality
    /// and cosine distance.
    async fn ensure_collection(&self, dimension: usize) -> Result<()>;

    /// Insert or replace the entry stored under `id`.
    async fn upsert(&self, id: u64, vector: Vec<f32>, payload: TablePayload) -> Result<()>;

    /// Nearest neighbors of `vector`, best-first, at most `top_k`.
    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredPayload>>;
}

#[derive(Default)]
struct Inner {
    dimension: Option<usize>,
    points: BTreeMap<u64, (Vec<f32>, TablePayload)>,
}

/// In-memory vector index with exact cosine search.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    inner: RwLock<Inner>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn ensure_collection(&self, dimension: usize) -> Result<()> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        match inner.dimension {
            None => {
                inner.dimension = Some(dimension);
                Ok(())
            }
            Some(existing) if existing == dimension => Ok(()),
            Some(existing) => Err(ChatError::Index(format!(
                "collection exists with dimension {}, requested {}",
                existing, dimension
            ))),
        }
    }

    async fn upsert(&self, id: u64, vector: Vec<f32>, payload: TablePayload) -> Result<()> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if let Some(dimension) = inner.dimension {
            if vector.len() != dimension {
                return Err(ChatError::Index(format!(
                    "vector dimension {} does not match collection dimension {}",
                    vector.len(),
                    dimension
                )));
            }
        }
        inner.points.insert(id, (vector, payload));
        Ok(())
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredPayload>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        if inner.points.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<ScoredPayload> = inner
            .points
            .values()
            .map(|(stored, payload)| ScoredPayload {
                payload: payload.clone(),
                score: Some(cosine_similarity(vector, stored)),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);
        Ok(hits)
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

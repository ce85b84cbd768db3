//! Qdrant-backed vector index over the REST API.

use crate::error::{ChatError, Result};
use crate::metadata::TablePayload;
use crate::vector_index::{ScoredPayload, VectorIndex, COLLECTION_NAME};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub struct QdrantIndex {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    collection: String,
}

#[derive(Serialize)]
struct UpsertPoint {
    id: u64,
    vector: Vec<f32>,
    payload: TablePayload,
}

#[derive(Serialize)]
struct SearchRequest {
    vector: Vec<f32>,
    limit: usize,
    with_payload: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<SearchEntry>,
}

#[derive(Deserialize)]
struct SearchEntry {
    score: Option<f32>,
    payload: Option<serde_json::Value>,
}

impl QdrantIndex {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            collection: COLLECTION_NAME.to_string(),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header("Content-Type", "application/json");
        match &self.api_key {
            Some(key) => builder.header("api-key", key.clone()),
            None => builder,
        }
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn ensure_collection(&self, dimension: usize) -> Result<()> {
        let url = format!("{}/collections/{}", self.base_url, self.collection);
        let body = serde_json::json!({
            "vectors": {
                "size": dimension,
                "distance": "Cosine"
            }
        });

        let response = self
            .request(self.http.put(url).json(&body))
            .send()
            .await
            .map_err(|e| ChatError::Index(format!("qdrant request failed: {}", e)))?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::CONFLICT => Ok(()),
            other => {
                let text = response.text().await.unwrap_or_default();
                Err(ChatError::Index(format!(
                    "qdrant collection error ({}): {}",
                    other, text
                )))
            }
        }
    }

    async fn upsert(&self, id: u64, vector: Vec<f32>, payload: TablePayload) -> Result<()> {
        let url = format!(
            "{}/collections/{}/points?wait=true",
            self.base_url, self.collection
        );
        let body = serde_json::json!({
            "points": [UpsertPoint { id, vector, payload }]
        });

        let response = self
            .request(self.http.put(url).json(&body))
            .send()
            .await
            .map_err(|e| ChatError::Index(format!("qdrant request failed: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(ChatError::Index(format!(
                "qdrant upsert failed ({}): {}",
                status, text
            )))
        }
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredPayload>> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection
        );
        let body = SearchRequest {
            vector: vector.to_vec(),
            limit: top_k,
            with_payload: true,
        };

        let response = self
            .request(self.http.post(url).json(&body))
            .send()
            .await
            .map_err(|e| ChatError::Index(format!("qdrant request failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            // Collection was never created: an empty index, not an error.
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ChatError::Index(format!(
                "qdrant search failed ({}): {}",
                status, text
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ChatError::Index(format!("failed to parse qdrant response: {}", e)))?;

        let mut hits = Vec::with_capacity(parsed.result.len());
        for entry in parsed.result {
            let payload_value = entry
                .payload
                .ok_or_else(|| ChatError::Index("qdrant hit without payload".to_string()))?;
            let payload: TablePayload = serde_json::from_value(payload_value)
                .map_err(|e| ChatError::Index(format!("malformed qdrant payload: {}", e)))?;
            hits.push(ScoredPayload {
                payload,
                score: entry.score,
            });
        }
        Ok(hits)
    }
}

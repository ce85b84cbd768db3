//! Embedding client - maps text to a fixed-length normalized vector via an
//! OpenAI-style embeddings API.

use crate::error::{ChatError, Result};
use async_trait::async_trait;

/// Instruction prefix applied to both metadata text and user questions so the
/// two live in the same retrieval space.
pub const RETRIEVAL_INSTRUCTION: &str = "Represent this metadata for retrieval: ";

/// Prefix `text` with the fixed retrieval instruction.
pub fn retrieval_prompt(text: &str) -> String {
    format!("{}{}", RETRIEVAL_INSTRUCTION, text)
}

/// Opaque vector-producing function. Implementations must be deterministic
/// for identical input and return L2-normalized vectors of `dimension()`.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn dimension(&self) -> usize;
}

/// Embedding client using an OpenAI-compatible API.
pub struct HttpEmbedder {
    api_key: String,
    base_url: String,
    model: String,
    dimension: usize,
}

impl HttpEmbedder {
    pub fn new(api_key: String, base_url: String, model: String, dimension: usize) -> Self {
        Self {
            api_key,
            base_url,
            model,
            dimension,
        }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let client = reqwest::Client::new();

        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let response = client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Embedding(format!("embedding API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChatError::Embedding(format!(
                "embedding API error ({}): {}",
                status, error_text
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChatError::Embedding(format!("failed to parse embedding response: {}", e)))?;

        let data = response_json
            .get("data")
            .and_then(|d| d.as_array())
            .and_then(|arr| arr.first())
            .ok_or_else(|| ChatError::Embedding("no embedding data in response".to_string()))?;

        let embedding: Vec<f32> = data
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| ChatError::Embedding("no embedding vector in response".to_string()))?
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();

        if embedding.len() != self.dimension {
            return Err(ChatError::Embedding(format!(
                "embedding dimension {} does not match configured dimension {}",
                embedding.len(),
                self.dimension
            )));
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieval_prompt_applies_prefix() {
        assert_eq!(
            retrieval_prompt("Table: sales"),
            "Represent this metadata for retrieval: Table: sales"
        );
    }
}

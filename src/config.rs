//! Environment-driven configuration.

use crate::error::{ChatError, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub llm_model: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub data_dir: PathBuf,
}

impl Config {
    /// Load configuration from the environment, reading a `.env` file when
    /// present. Only the API key is required; everything else has defaults.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ChatError::Config("OPENAI_API_KEY is not set".to_string()))?;

        let embedding_dimension = match std::env::var("EMBEDDING_DIMENSION") {
            Ok(raw) => raw.parse::<usize>().map_err(|_| {
                ChatError::Config(format!("EMBEDDING_DIMENSION is not a number: {}", raw))
            })?,
            Err(_) => 1536,
        };

        Ok(Self {
            openai_api_key,
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            llm_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            embedding_dimension,
            qdrant_url: std::env::var("QDRANT_URL")
                .unwrap_or_else(|_| "http://localhost:6333".to_string()),
            qdrant_api_key: std::env::var("QDRANT_API_KEY").ok(),
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
        })
    }
}

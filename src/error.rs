use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Unreadable file: {0}")]
    UnreadableFile(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Query synthesis failed: {0}")]
    Synthesis(String),

    #[error("Query execution failed: {0}")]
    Execution(String),

    #[error("Repaired query failed: {0}")]
    Repair(String),

    #[error("Table data not found in store: {0}")]
    MissingTable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(String),
}

impl From<polars::error::PolarsError> for ChatError {
    fn from(err: polars::error::PolarsError) -> Self {
        ChatError::Polars(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;

//! tablechat - ask natural-language questions over CSV/Excel tables.
//!
//! The pipeline indexes table metadata as embedding vectors, routes a
//! question to the single most relevant table by cosine similarity,
//! synthesizes a read-only SQL query with an LLM, executes it in-process
//! with polars, repairs it once on failure, and summarizes the result.

pub mod config;
pub mod embed;
pub mod error;
pub mod execution;
pub mod extract;
pub mod indexer;
pub mod llm;
pub mod metadata;
pub mod pipeline;
pub mod qdrant;
pub mod router;
pub mod store;
pub mod summarize;
pub mod synthesis;
pub mod validator;
pub mod vector_index;

pub use config::Config;
pub use embed::{Embedder, HttpEmbedder, RETRIEVAL_INSTRUCTION};
pub use error::{ChatError, Result};
pub use execution::{execute, QueryResult, ResultShape};
pub use extract::{extract_metadata, read_table, TableFormat, SAMPLE_ROWS};
pub use indexer::{stable_table_id, IndexReport, Indexer};
pub use llm::{CompletionClient, HttpCompletionClient};
pub use metadata::{ColumnType, TableMetadata, TablePayload};
pub use pipeline::{Answer, AskOutcome, QueryPipeline};
pub use qdrant::QdrantIndex;
pub use router::{RoutingResult, TableRouter};
pub use store::{DirTableStore, MemoryTableStore, TableStore};
pub use summarize::ResultSummarizer;
pub use synthesis::{QueryRepairer, QuerySynthesizer};
pub use validator::QueryValidator;
pub use vector_index::{InMemoryVectorIndex, ScoredPayload, VectorIndex, COLLECTION_NAME};

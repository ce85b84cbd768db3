//! End-to-end pipeline scenarios with scripted embedding and completion
//! doubles: no network, real extraction, routing and SQL execution.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tablechat::{
    AskOutcome, ChatError, CompletionClient, Embedder, InMemoryVectorIndex, Indexer,
    MemoryTableStore, QueryPipeline, Result, TableRouter,
};

const DIMENSION: usize = 32;

/// Deterministic byte-bag embedder: identical text always maps to the same
/// normalized vector, so a verbatim metadata text query scores 1.0 against
/// its own table.
struct HashEmbedder;

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; DIMENSION];
        for byte in text.bytes() {
            vector[byte as usize % DIMENSION] += 1.0;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }
}

/// Completion double that replays a fixed script and counts calls.
struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for ScriptedLlm {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        responses
            .pop_front()
            .ok_or_else(|| ChatError::Llm("scripted responses exhausted".to_string()))
    }
}

const SALES_CSV: &[u8] = b"region,amount\nA,10\nB,20\nA,5\n";
const USERS_CSV: &[u8] = b"user_id,name,signup\n1,ada,2024-01-01\n2,bob,2024-02-02\n";

async fn indexed_fixtures(files: &[(&str, &[u8])]) -> (Arc<MemoryTableStore>, Arc<InMemoryVectorIndex>) {
    let store = Arc::new(MemoryTableStore::new());
    for (name, bytes) in files {
        store.insert(*name, bytes.to_vec());
    }

    let index = Arc::new(InMemoryVectorIndex::new());
    let indexer = Indexer::new(Arc::new(HashEmbedder), index.clone());
    let report = indexer.index_store(store.as_ref()).await.unwrap();
    assert!(report.failed.is_empty());
    (store, index)
}

#[tokio::test]
async fn aggregate_question_yields_scalar_answer() {
    let (store, index) = indexed_fixtures(&[("sales.csv", SALES_CSV)]).await;
    let llm = ScriptedLlm::new(&[
        "yes",
        "```sql\nSELECT SUM(amount) AS total FROM sales WHERE region = 'A'\n```",
        "The total amount for region A is 15.",
    ]);

    let pipeline = QueryPipeline::new(Arc::new(HashEmbedder), index, llm.clone(), store);
    let outcome = pipeline.ask("total amount for region A").await.unwrap();

    let AskOutcome::Answered(answer) = outcome else {
        panic!("expected an answer");
    };
    assert_eq!(answer.table_name, "sales");
    assert_eq!(answer.source_file, "sales.csv");
    assert!(!answer.repaired);
    assert_eq!(answer.sql, "SELECT SUM(amount) AS total FROM sales WHERE region = 'A'");
    assert!(answer.rendering.contains("15"));
    assert!(answer.summary.contains("15"));
    let score = answer.score.expect("in-memory index always scores");
    assert!((0.0..=1.0).contains(&score));
    // validator + synthesizer + summarizer
    assert_eq!(llm.call_count(), 3);
}

#[tokio::test]
async fn empty_question_halts_before_routing() {
    let (store, index) = indexed_fixtures(&[("sales.csv", SALES_CSV)]).await;
    let llm = ScriptedLlm::new(&[]);

    let pipeline = QueryPipeline::new(Arc::new(HashEmbedder), index, llm.clone(), store);
    let outcome = pipeline.ask("").await.unwrap();

    assert!(matches!(outcome, AskOutcome::Rejected));
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn non_data_question_is_rejected() {
    let (store, index) = indexed_fixtures(&[("sales.csv", SALES_CSV)]).await;
    let llm = ScriptedLlm::new(&["no"]);

    let pipeline = QueryPipeline::new(Arc::new(HashEmbedder), index, llm.clone(), store);
    let outcome = pipeline.ask("asdf qwerty zxcv").await.unwrap();

    assert!(matches!(outcome, AskOutcome::Rejected));
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn failed_query_is_repaired_exactly_once() {
    let (store, index) = indexed_fixtures(&[("sales.csv", SALES_CSV)]).await;
    let llm = ScriptedLlm::new(&[
        "yes",
        "SELECT bogus_column FROM sales",
        "SELECT SUM(amount) AS total FROM sales WHERE region = 'A'",
        "The total amount for region A is 15.",
    ]);

    let pipeline = QueryPipeline::new(Arc::new(HashEmbedder), index, llm.clone(), store);
    let outcome = pipeline.ask("total amount for region A").await.unwrap();

    let AskOutcome::Answered(answer) = outcome else {
        panic!("expected an answer");
    };
    assert!(answer.repaired);
    assert!(answer.rendering.contains("15"));
    // validator + synthesizer + repairer + summarizer
    assert_eq!(llm.call_count(), 4);
}

#[tokio::test]
async fn failed_repair_is_terminal() {
    let (store, index) = indexed_fixtures(&[("sales.csv", SALES_CSV)]).await;
    let llm = ScriptedLlm::new(&[
        "yes",
        "SELECT bogus_column FROM sales",
        "SELECT still_bogus FROM sales",
    ]);

    let pipeline = QueryPipeline::new(Arc::new(HashEmbedder), index, llm.clone(), store);
    let err = pipeline.ask("total amount for region A").await.unwrap_err();

    assert!(matches!(err, ChatError::Repair(_)));
    // the summarizer never ran: validator + synthesizer + repairer only
    assert_eq!(llm.call_count(), 3);
}

#[tokio::test]
async fn verbatim_metadata_text_routes_to_its_table() {
    let (_store, index) =
        indexed_fixtures(&[("sales.csv", SALES_CSV), ("users.csv", USERS_CSV)]).await;

    let router = TableRouter::new(Arc::new(HashEmbedder), index);
    let users_metadata_text = tablechat::extract_metadata("users.csv", USERS_CSV)
        .unwrap()
        .metadata_text;

    let routed = router.route(&users_metadata_text).await.unwrap().unwrap();
    assert_eq!(routed.payload.table_name, "users");
    let score = routed.score.unwrap();
    assert!(score > 0.99 && score <= 1.0 + f32::EPSILON);
}

#[tokio::test]
async fn empty_index_is_a_normal_no_match() {
    let store = Arc::new(MemoryTableStore::new());
    let index = Arc::new(InMemoryVectorIndex::new());

    let router = TableRouter::new(Arc::new(HashEmbedder), index.clone());
    assert!(router.route("anything").await.unwrap().is_none());

    let llm = ScriptedLlm::new(&["yes"]);
    let pipeline = QueryPipeline::new(Arc::new(HashEmbedder), index, llm.clone(), store);
    let outcome = pipeline.ask("anything at all about data").await.unwrap();
    assert!(matches!(outcome, AskOutcome::NoMatch));
}

#[tokio::test]
async fn reindexing_unchanged_set_is_idempotent() {
    let store = Arc::new(MemoryTableStore::new());
    store.insert("sales.csv", SALES_CSV.to_vec());
    store.insert("users.csv", USERS_CSV.to_vec());

    let index = Arc::new(InMemoryVectorIndex::new());
    let indexer = Indexer::new(Arc::new(HashEmbedder), index.clone());

    indexer.index_store(store.as_ref()).await.unwrap();
    let first_len = index.len();
    indexer.index_store(store.as_ref()).await.unwrap();

    assert_eq!(index.len(), first_len);
    assert_eq!(index.len(), 2);
}

#[tokio::test]
async fn unreadable_table_does_not_abort_indexing() {
    let store = Arc::new(MemoryTableStore::new());
    store.insert("sales.csv", SALES_CSV.to_vec());
    store.insert("broken.xlsx", b"not a workbook".to_vec());

    let index = Arc::new(InMemoryVectorIndex::new());
    let indexer = Indexer::new(Arc::new(HashEmbedder), index.clone());
    let report = indexer.index_store(store.as_ref()).await.unwrap();

    assert_eq!(report.indexed, vec!["sales.csv"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "broken.xlsx");
    assert_eq!(index.len(), 1);
}

//! Query pipeline - validate, route, synthesize, execute, repair once on
//! failure, summarize. Stages run strictly in order; no stage is retried
//! beyond the single repair cycle.

use crate::embed::Embedder;
use crate::error::{ChatError, Result};
use crate::execution::{execute, QueryResult};
use crate::extract::{read_table, TableFormat};
use crate::llm::CompletionClient;
use crate::router::{RoutingResult, TableRouter};
use crate::store::TableStore;
use crate::summarize::ResultSummarizer;
use crate::synthesis::{QueryRepairer, QuerySynthesizer};
use crate::validator::QueryValidator;
use crate::vector_index::VectorIndex;
use std::sync::Arc;
use tracing::{info, warn};

/// A completed answer for one question.
#[derive(Debug, Clone)]
pub struct Answer {
    pub table_name: String,
    pub source_file: String,
    pub score: Option<f32>,
    /// The SQL that actually produced the result (the repaired statement if
    /// repair ran).
    pub sql: String,
    pub repaired: bool,
    pub rendering: String,
    pub summary: String,
}

/// Terminal pipeline outcomes that are not errors.
#[derive(Debug)]
pub enum AskOutcome {
    /// The validator judged the input not to be a meaningful data question.
    Rejected,
    /// The index is empty or returned no candidate table.
    NoMatch,
    Answered(Box<Answer>),
}

pub struct QueryPipeline {
    store: Arc<dyn TableStore>,
    validator: QueryValidator,
    router: TableRouter,
    synthesizer: QuerySynthesizer,
    repairer: QueryRepairer,
    summarizer: ResultSummarizer,
}

impl QueryPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn CompletionClient>,
        store: Arc<dyn TableStore>,
    ) -> Self {
        Self {
            store,
            validator: QueryValidator::new(llm.clone()),
            router: TableRouter::new(embedder, index),
            synthesizer: QuerySynthesizer::new(llm.clone()),
            repairer: QueryRepairer::new(llm.clone()),
            summarizer: ResultSummarizer::new(llm),
        }
    }

    /// Run the full pipeline for one question.
    pub async fn ask(&self, question: &str) -> Result<AskOutcome> {
        if !self.validator.is_meaningful(question).await? {
            info!("question rejected by validator");
            return Ok(AskOutcome::Rejected);
        }

        let Some(routed) = self.router.route(question).await? else {
            info!("no matching table found");
            return Ok(AskOutcome::NoMatch);
        };

        let data = self.load_table(&routed)?;
        let sql = self.synthesizer.synthesize(question, &routed.payload).await?;
        info!(sql = %sql, "synthesized query");

        let (result, final_sql, repaired) = self
            .execute_with_repair(question, &routed, sql, data)
            .await?;

        let rendering = result.render();
        let summary = self.summarizer.summarize(question, &rendering).await?;

        Ok(AskOutcome::Answered(Box::new(Answer {
            table_name: routed.payload.table_name,
            source_file: routed.payload.source_file,
            score: routed.score,
            sql: final_sql,
            repaired,
            rendering,
            summary,
        })))
    }

    fn load_table(&self, routed: &RoutingResult) -> Result<polars::prelude::DataFrame> {
        let bytes = self.store.read(&routed.payload.source_file)?;
        let format = TableFormat::from_source(&routed.payload.source_file)?;
        read_table(&bytes, format, None)
    }

    /// First execution attempt, then exactly one repair-and-retry cycle.
    /// Failure of the retry is terminal for the request.
    async fn execute_with_repair(
        &self,
        question: &str,
        routed: &RoutingResult,
        sql: String,
        data: polars::prelude::DataFrame,
    ) -> Result<(QueryResult, String, bool)> {
        let table_name = &routed.payload.table_name;

        let error_text = match execute(&sql, table_name, data.clone()) {
            Ok(result) => return Ok((result, sql, false)),
            Err(ChatError::Execution(msg)) => msg,
            Err(e) => return Err(e),
        };

        warn!(error = %error_text, "query failed, attempting one repair");
        let fixed = self
            .repairer
            .repair(question, &sql, &error_text, table_name)
            .await?;
        info!(sql = %fixed, "repaired query");

        match execute(&fixed, table_name, data) {
            Ok(result) => Ok((result, fixed, true)),
            Err(ChatError::Execution(msg)) => Err(ChatError::Repair(msg)),
            Err(e) => Err(e),
        }
    }
}

//! Query synthesis and repair - natural language to a single read-only SQL
//! statement against the routed table, plus the one-shot fix after a failed
//! execution.

use crate::error::{ChatError, Result};
use crate::llm::{strip_code_fences, CompletionClient};
use crate::metadata::TablePayload;
use std::sync::Arc;

pub struct QuerySynthesizer {
    llm: Arc<dyn CompletionClient>,
}

impl QuerySynthesizer {
    pub fn new(llm: Arc<dyn CompletionClient>) -> Self {
        Self { llm }
    }

    /// Produce one SELECT-only statement for the question against the routed
    /// table. The output is not validated here; errors surface at execution.
    pub async fn synthesize(&self, question: &str, table: &TablePayload) -> Result<String> {
        let prompt = format!(
            "Table name: {}\n\
             Columns:\n{}\n\
             User query: {}\n\
             Generate a single SQL command using only this table, only SELECT statements, \
             and do not modify data. Do NOT use multiple SQL commands, UNION, or UNION ALL. \
             Add WHERE, ORDER BY, LIMIT if needed. Return only a single SQL code.",
            table.table_name,
            table.column_lines(),
            question
        );

        let response = self.llm.complete(&prompt).await?;
        let sql = strip_code_fences(&response);
        if sql.is_empty() {
            return Err(ChatError::Synthesis(
                "model returned an empty query".to_string(),
            ));
        }
        Ok(sql)
    }
}

pub struct QueryRepairer {
    llm: Arc<dyn CompletionClient>,
}

impl QueryRepairer {
    pub fn new(llm: Arc<dyn CompletionClient>) -> Self {
        Self { llm }
    }

    /// Single-shot correction of a failed query. Callers invoke this at most
    /// once per request; a second failure is terminal.
    pub async fn repair(
        &self,
        question: &str,
        failed_query: &str,
        error_text: &str,
        table_name: &str,
    ) -> Result<String> {
        let prompt = format!(
            "User's natural language query:\n{}\n\n\
             Generated SQL:\n{}\n\n\
             Received error:\n{}\n\n\
             Please fix the above SQL so it executes against the table '{}'. \
             Keep it a single SELECT statement on that table only. Return only the SQL code.",
            question, failed_query, error_text, table_name
        );

        let response = self.llm.complete(&prompt).await?;
        let sql = strip_code_fences(&response);
        if sql.is_empty() {
            return Err(ChatError::Synthesis(
                "model returned an empty repaired query".to_string(),
            ));
        }
        Ok(sql)
    }
}

//! Result Summarizer - turns a rendered query result back into a concise
//! natural-language answer.

use crate::error::Result;
use crate::llm::CompletionClient;
use std::sync::Arc;

pub struct ResultSummarizer {
    llm: Arc<dyn CompletionClient>,
}

impl ResultSummarizer {
    pub fn new(llm: Arc<dyn CompletionClient>) -> Self {
        Self { llm }
    }

    pub async fn summarize(&self, question: &str, result_rendering: &str) -> Result<String> {
        let prompt = format!(
            "You are a database assistant. The user's natural language query and the SQL query \
             result are given below.\n\
             Provide a clear, concise, and user-friendly summary in a formal and conversational \
             style. Summarize the result as a table if needed, or explain numerically if \
             appropriate. Avoid unnecessary technical details.\n\n\
             User query:\n{}\n\n\
             SQL result:\n{}\n\n\
             Your answer:",
            question, result_rendering
        );

        let response = self.llm.complete(&prompt).await?;
        Ok(response.trim().to_string())
    }
}

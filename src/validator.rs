//! Query gate - cheap yes/no check that the input is a meaningful data
//! question before retrieval and generation spend anything.

use crate::error::Result;
use crate::llm::CompletionClient;
use std::sync::Arc;

pub struct QueryValidator {
    llm: Arc<dyn CompletionClient>,
}

impl QueryValidator {
    pub fn new(llm: Arc<dyn CompletionClient>) -> Self {
        Self { llm }
    }

    /// Best-effort heuristic gate, not a correctness guarantee. Empty input
    /// is rejected without a completion call; otherwise accepts iff the
    /// response begins with an affirmative token.
    pub async fn is_meaningful(&self, text: &str) -> Result<bool> {
        if text.trim().is_empty() {
            return Ok(false);
        }

        let prompt = format!(
            "Is the following text a meaningful natural language query addressed to a database assistant?\n\
             Answer only 'yes' or 'no'.\n\n\
             Query:\n{}",
            text
        );

        let response = self.llm.complete(&prompt).await?;
        Ok(response.trim().to_lowercase().starts_with("yes"))
    }
}

//! LLM client - one "send prompt, get text" capability shared by the
//! validator, synthesizer, repairer and summarizer.

use crate::error::{ChatError, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

/// Opaque single-turn text-completion function. No conversational state is
/// carried between calls.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Completion client over an OpenAI-compatible chat API.
#[derive(Clone)]
pub struct HttpCompletionClient {
    api_key: String,
    base_url: String,
    model: String,
}

impl HttpCompletionClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            api_key,
            base_url,
            model,
        }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let client = reqwest::Client::new();

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.1,
            "max_tokens": 500,
        });

        let response = client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Llm(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChatError::Llm(format!(
                "LLM API error ({}): {}",
                status, error_text
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChatError::Llm(format!("failed to parse LLM response: {}", e)))?;

        if let Some(error) = response_json.get("error") {
            return Err(ChatError::Llm(format!("LLM API error: {}", error)));
        }

        let choices = response_json
            .get("choices")
            .and_then(|c| c.as_array())
            .ok_or_else(|| ChatError::Llm("no choices array in LLM response".to_string()))?;

        let content = choices
            .first()
            .and_then(|c| c["message"]["content"].as_str())
            .ok_or_else(|| ChatError::Llm("no content in LLM response".to_string()))?;

        if content.is_empty() {
            return Err(ChatError::Llm("empty content in LLM response".to_string()));
        }

        Ok(content.to_string())
    }
}

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"(?m)^```[a-zA-Z]*[ \t]*|```$").unwrap();
}

/// Strip enclosing markdown code-fence markup from a completion.
pub fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw.trim(), "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_sql_fences() {
        let raw = "```sql\nSELECT * FROM sales\n```";
        assert_eq!(strip_code_fences(raw), "SELECT * FROM sales");
    }

    #[test]
    fn strips_bare_fences() {
        let raw = "```\nSELECT 1\n```";
        assert_eq!(strip_code_fences(raw), "SELECT 1");
    }

    #[test]
    fn leaves_plain_sql_alone() {
        let raw = "  SELECT region FROM sales LIMIT 5  ";
        assert_eq!(strip_code_fences(raw), "SELECT region FROM sales LIMIT 5");
    }

    #[test]
    fn fenced_empty_body_becomes_empty() {
        assert_eq!(strip_code_fences("```sql\n```"), "");
    }
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backends::CompletionClient;
use crate::prompt;

/// Completion client for a local Ollama server. All pipeline prompts expect
/// structured output, so generation always runs in JSON mode.
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: String,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url,
            model,
            client,
        }
    }

    pub fn default() -> Self {
        Self::new(
            "http://localhost:11434".to_string(),
            "llama3".to_string(),
            60,
        )
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            format: "json".to_string(),
        };

        let response = self.client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            anyhow::bail!("Ollama request failed: {}", response.status());
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(ollama_response.response)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl CompletionClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.generate(prompt).await
    }
}

/// Complete a prompt and insist on syntactically valid JSON, asking the
/// model to repair its own output before giving up.
pub async fn complete_json_with_retry(
    client: &dyn CompletionClient,
    prompt: &str,
    max_retries: usize,
) -> Result<String> {
    for attempt in 0..max_retries {
        let response = client.complete(prompt).await?;

        if serde_json::from_str::<serde_json::Value>(&response).is_ok() {
            return Ok(response);
        }

        if attempt < max_retries - 1 {
            let retry_prompt = prompt::build_retry_prompt(&response);

            let corrected = client.complete(&retry_prompt).await?;
            if serde_json::from_str::<serde_json::Value>(&corrected).is_ok() {
                return Ok(corrected);
            }
        }
    }

    anyhow::bail!("Failed to get valid JSON after {} retries", max_retries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyJsonClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionClient for FlakyJsonClient {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Ok("not json at all".to_string())
            } else {
                Ok(r#"{"ok": true}"#.to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_json_retry_recovers() {
        let client = FlakyJsonClient {
            calls: AtomicUsize::new(0),
        };
        let out = complete_json_with_retry(&client, "prompt", 3).await.unwrap();
        assert_eq!(out, r#"{"ok": true}"#);
    }
}

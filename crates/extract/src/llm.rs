use std::future::Future;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AugmentError;
use crate::prompt;
use crate::retry::RetryPolicy;

/// External model that supplements rule-based extraction.
///
/// Returns the raw JSON text of the model's answer. Retry and backoff are the
/// implementation's business; callers only see success or failure.
pub trait Augmenter {
    fn augment(&self, prompt: &str) -> impl Future<Output = Result<String, AugmentError>> + Send;
}

impl<A: Augmenter + Sync> Augmenter for &A {
    fn augment(&self, prompt: &str) -> impl Future<Output = Result<String, AugmentError>> + Send {
        (**self).augment(prompt)
    }
}

/// Augmenter for runs without a model: always unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAugmenter;

impl Augmenter for NoAugmenter {
    async fn augment(&self, _prompt: &str) -> Result<String, AugmentError> {
        Err(AugmentError::unavailable("no augmentation model configured"))
    }
}

#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
    retry: RetryPolicy,
    json_retries: usize,
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: String, // "json" for structured output
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
            retry: RetryPolicy::default(),
            json_retries: 3,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            format: "json".to_string(), // Force JSON output
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

    async fn generate_with_backoff(&self, prompt: &str) -> Result<String> {
        self.retry
            .retry("ollama_generate", || self.generate(prompt))
            .await
    }

    /// Generate with retry for invalid JSON
    pub async fn generate_json_with_retry(&self, prompt: &str, max_retries: usize) -> Result<String> {
        for attempt in 0..max_retries {
            let response = self.generate_with_backoff(prompt).await?;

            if serde_json::from_str::<serde_json::Value>(&response).is_ok() {
                return Ok(response);
            }
            debug!(attempt, "Model returned invalid JSON");

            // If invalid, retry with correction prompt
            if attempt < max_retries - 1 {
                let corrected = self
                    .generate_with_backoff(&prompt::build_retry_prompt(&response))
                    .await?;
                if serde_json::from_str::<serde_json::Value>(&corrected).is_ok() {
                    return Ok(corrected);
                }
            }
        }

        anyhow::bail!("Failed to get valid JSON after {} retries", max_retries)
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new(
            "http://localhost:11434".to_string(),
            "llama3".to_string(),
        )
    }
}

impl Augmenter for OllamaClient {
    async fn augment(&self, prompt: &str) -> Result<String, AugmentError> {
        self.generate_json_with_retry(prompt, self.json_retries)
            .await
            .map_err(|e| {
                warn!(error = %e, model = %self.model, "Augmentation call failed");
                AugmentError::unavailable(format!("{:#}", e))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_augmenter_is_unavailable() {
        let err = NoAugmenter.augment("anything").await.unwrap_err();
        assert!(matches!(err, AugmentError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_ollama_fails_soft() {
        // Port 9 (discard) is not an Ollama server.
        let client = OllamaClient::new("http://127.0.0.1:9".to_string(), "llama3".to_string())
            .with_retry(RetryPolicy::none());
        let err = client.augment("{}").await.unwrap_err();
        assert!(matches!(err, AugmentError::Unavailable(_)));
    }
}

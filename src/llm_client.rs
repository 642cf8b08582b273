// src/llm_client.rs - Client for the external text-generation API
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("generation API unreachable: {0}")]
    Request(#[from] reqwest::Error),
    #[error("generation API returned {0}")]
    Status(reqwest::StatusCode),
    #[error("no JSON object in model response")]
    NoJson,
    #[error("malformed model response: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl LlmClient {
    pub fn new(base_url: String, model: String) -> Self {
        info!("Initializing LLM client");
        info!("   URL: {}", base_url);
        info!("   Model: {}", model);

        Self {
            client: Client::new(),
            base_url,
            model,
        }
    }

    /// Single free-text generation attempt. No retry, no explicit timeout.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, LlmError> {
        self.generate(prompt, false).await
    }

    /// Single JSON-mode generation attempt, parsed leniently into `T`.
    pub async fn generate_json<T: DeserializeOwned>(&self, prompt: &str) -> Result<T, LlmError> {
        let raw = self.generate(prompt, true).await?;
        parse_json_lenient(&raw)
    }

    async fn generate(&self, prompt: &str, json_mode: bool) -> Result<String, LlmError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: json_mode.then_some("json"),
        };

        let url = format!("{}/api/generate", self.base_url);

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(LlmError::Status(response.status()));
        }

        let body: GenerateResponse = response.json().await?;

        info!("Received {} chars from generation API", body.response.len());

        Ok(body.response)
    }

    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/version", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

/// Runs a generation future and recovers with `fallback` on any failure. The
/// external error never reaches the caller; components that must not fail
/// route every model call through here.
pub async fn with_fallback<T, Fut, F>(primary: Fut, fallback: F) -> T
where
    Fut: Future<Output = Result<T, LlmError>>,
    F: FnOnce(LlmError) -> T,
{
    match primary.await {
        Ok(value) => value,
        Err(e) => {
            warn!("⚠️  Generation call failed, applying fallback: {}", e);
            fallback(e)
        }
    }
}

/// Strict parse first, then the first `{...}` substring; models often wrap
/// their JSON in code fences or prose.
pub(crate) fn parse_json_lenient<T: DeserializeOwned>(raw: &str) -> Result<T, LlmError> {
    let text = raw.trim();

    if let Ok(parsed) = serde_json::from_str(text) {
        return Ok(parsed);
    }

    let cleaned = text
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let start = cleaned.find('{').ok_or(LlmError::NoJson)?;
    let end = cleaned.rfind('}').ok_or(LlmError::NoJson)?;
    if start >= end {
        return Err(LlmError::NoJson);
    }

    Ok(serde_json::from_str(&cleaned[start..=end])?)
}

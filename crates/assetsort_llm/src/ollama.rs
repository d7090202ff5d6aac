//! Ollama transport
//!
//! Talks to `POST {base_url}/api/generate` with streaming disabled.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::{CompletionClient, LlmError};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<Reasoning<'a>>,
}

#[derive(Debug, Serialize)]
struct Reasoning<'a> {
    effort: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

/// Client for an Ollama server
pub struct OllamaClient {
    http: Client,
    base_url: String,
    model: String,
    reasoning_effort: Option<String>,
}

impl OllamaClient {
    /// Create a client; every request is bounded by `timeout`.
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        reasoning_effort: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            reasoning_effort: reasoning_effort.filter(|effort| !effort.is_empty()),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            reasoning: self
                .reasoning_effort
                .as_deref()
                .map(|effort| Reasoning { effort }),
        }
    }
}

/// Extract the completion text from a `/api/generate` response body.
///
/// Falls back from `response` to `data`; an empty `response` counts as absent.
pub(crate) fn parse_generate_response(body: &str) -> Result<String, LlmError> {
    let parsed: GenerateResponse = serde_json::from_str(body)?;
    Ok(parsed
        .response
        .filter(|text| !text.is_empty())
        .or(parsed.data)
        .unwrap_or_default())
}

impl CompletionClient for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    fn try_complete(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "ollama generate");
        let response = self
            .http
            .post(self.endpoint())
            .json(&self.request_body(prompt))
            .send()?
            .error_for_status()?;
        let body = response.text()?;
        parse_generate_response(&body)
    }
}

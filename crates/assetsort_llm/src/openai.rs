//! OpenAI-compatible chat completions transport

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::{CompletionClient, LlmError};

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Client for any server speaking the OpenAI chat completions API
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
    reasoning_effort: Option<String>,
}

impl OpenAiClient {
    /// Create a client. An empty `base_url` selects [`DEFAULT_BASE_URL`].
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
        reasoning_effort: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(LlmError::Config("OpenAI API key is empty".to_string()));
        }
        let base_url = if base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url
        };
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            reasoning_effort: reasoning_effort.filter(|effort| !effort.is_empty()),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            reasoning_effort: self.reasoning_effort.as_ref().map(|e| e.to_lowercase()),
        }
    }
}

/// Extract `choices[0].message.content`, or `""` when the model said nothing.
pub(crate) fn parse_chat_response(body: &str) -> Result<String, LlmError> {
    let parsed: ChatResponse = serde_json::from_str(body)?;
    Ok(parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .unwrap_or_default())
}

impl CompletionClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn try_complete(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "openai chat completion");
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt))
            .send()?
            .error_for_status()?;
        let body = response.text()?;
        parse_chat_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> OpenAiClient {
        OpenAiClient::new(
            "sk-test",
            "gpt-4o-mini",
            base_url,
            Some("Low".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_default_base_url() {
        assert_eq!(client("").endpoint(), "https://api.openai.com/v1/chat/completions");
        assert_eq!(
            client("http://localhost:8080/v1/").endpoint(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = OpenAiClient::new("", "m", "", None, Duration::from_secs(1));
        assert!(matches!(result, Err(LlmError::Config(_))));
    }

    #[test]
    fn test_request_body() {
        let client = client("");
        let body = serde_json::to_value(client.request_body("hello")).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
        assert_eq!(body["reasoning_effort"], "low");
    }

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "wood, oak"}}]}"#;
        assert_eq!(parse_chat_response(body).unwrap(), "wood, oak");
    }

    #[test]
    fn test_parse_missing_content() {
        assert_eq!(parse_chat_response(r#"{"choices": []}"#).unwrap(), "");
        assert_eq!(
            parse_chat_response(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap(),
            ""
        );
    }
}

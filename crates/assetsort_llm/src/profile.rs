//! Provider profiles and client construction

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::{LlmError, OllamaClient, OpenAiClient, SharedClient};

/// Connection settings for one completion backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Display name, referenced by `classification.active_provider`
    pub profile_name: String,

    /// Backend kind: "ollama" or "openai" (case-insensitive)
    pub provider: String,

    /// API key (OpenAI only; falls back to `OPENAI_API_KEY`)
    #[serde(default)]
    pub api_key: String,

    /// Server base URL; empty selects the provider default
    #[serde(default)]
    pub base_url: String,

    /// Model identifier
    #[serde(default)]
    pub model: String,

    /// Reasoning effort hint forwarded to the backend; empty disables it
    #[serde(default = "default_reasoning_effort")]
    pub reasoning_effort: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_reasoning_effort() -> String {
    "Low".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for ProviderProfile {
    fn default() -> Self {
        Self {
            profile_name: "mistral small".to_string(),
            provider: "Ollama".to_string(),
            api_key: String::new(),
            base_url: "https://api.llm.gestaltservers.com".to_string(),
            model: "deepseek-r1:1.5b".to_string(),
            reasoning_effort: default_reasoning_effort(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl ProviderProfile {
    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }

    fn reasoning(&self) -> Option<String> {
        Some(self.reasoning_effort.clone()).filter(|effort| !effort.is_empty())
    }
}

/// Build the client described by `profile`.
pub fn create_client(profile: &ProviderProfile) -> Result<SharedClient, LlmError> {
    match profile.provider.to_lowercase().as_str() {
        "ollama" => {
            if profile.base_url.is_empty() {
                return Err(LlmError::Config(format!(
                    "profile '{}' has no base_url",
                    profile.profile_name
                )));
            }
            let client = OllamaClient::new(
                &profile.base_url,
                profile.model.clone(),
                profile.reasoning(),
                profile.timeout(),
            )?;
            Ok(Arc::new(client))
        }
        "openai" => {
            let api_key = if profile.api_key.is_empty() {
                std::env::var("OPENAI_API_KEY").unwrap_or_default()
            } else {
                profile.api_key.clone()
            };
            let client = OpenAiClient::new(
                api_key,
                profile.model.clone(),
                &profile.base_url,
                profile.reasoning(),
                profile.timeout(),
            )?;
            Ok(Arc::new(client))
        }
        _ => Err(LlmError::UnsupportedProvider(profile.provider.clone())),
    }
}

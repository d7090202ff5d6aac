//! Completion backends for assetsort
//!
//! Classification modules may ask a language model for a suggestion (a
//! filetype, an asset name, a tag list). This crate defines the one operation
//! they rely on, [`CompletionClient::complete`], and the transports behind it.
//!
//! The contract is deliberately lossy: an empty string means "no opinion,
//! use the local heuristic". Transport failures are logged and collapsed to
//! an empty answer so a slow or unreachable backend can never abort a
//! classification run.
//!
//! # Example
//!
//! ```rust,ignore
//! use assetsort_llm::{create_client, ProviderProfile};
//!
//! let client = create_client(&ProviderProfile::default())?;
//! let tags = client.complete("Suggest tags\nAsset name: wood");
//! ```

pub mod error;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod profile;

use std::sync::Arc;
use tracing::warn;

pub use error::LlmError;
pub use mock::ScriptedClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use profile::{create_client, ProviderProfile};

/// A text-completion backend.
///
/// Implementors only provide [`try_complete`](Self::try_complete); callers use
/// [`complete`](Self::complete), which never fails.
pub trait CompletionClient: Send + Sync {
    /// Short backend name used in log lines (e.g. "ollama").
    fn name(&self) -> &str;

    /// Ask the backend for a completion of `prompt`.
    fn try_complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Ask the backend for a completion, degrading any failure to `""`.
    fn complete(&self, prompt: &str) -> String {
        match self.try_complete(prompt) {
            Ok(text) => text,
            Err(err) => {
                warn!(
                    client = self.name(),
                    error = %err,
                    "completion failed, deferring to local heuristics"
                );
                String::new()
            }
        }
    }
}

/// Shared handle to a completion backend.
pub type SharedClient = Arc<dyn CompletionClient>;

/// Backend that never has an opinion.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpClient;

impl CompletionClient for NoOpClient {
    fn name(&self) -> &str {
        "noop"
    }

    fn try_complete(&self, _prompt: &str) -> Result<String, LlmError> {
        Ok(String::new())
    }
}

/// A [`NoOpClient`] behind the shared handle type.
pub fn noop_client() -> SharedClient {
    Arc::new(NoOpClient)
}

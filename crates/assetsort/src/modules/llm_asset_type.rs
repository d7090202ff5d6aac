//! Collaborator-assisted asset typing

use assetsort_llm::SharedClient;
use tracing::debug;

use crate::module::{type_name_of, Module, Routing};
use crate::state::ClassificationState;

/// Asks the completion client for the type of every untyped asset
pub struct LlmAssetTypeModule {
    name: String,
    client: SharedClient,
    prompt: String,
}

impl LlmAssetTypeModule {
    pub fn new(client: SharedClient, prompt: impl Into<String>) -> Self {
        Self {
            name: type_name_of::<Self>(),
            client,
            prompt: prompt.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Module for LlmAssetTypeModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, state: &mut ClassificationState) -> Routing {
        let mut asked = 0usize;
        let mut assigned = 0usize;
        for source in state.sources.values_mut() {
            for asset in source.assets.values_mut() {
                if asset.asset_type.is_some() {
                    continue;
                }
                let name = asset.asset_name.as_deref().unwrap_or_default();
                let answer = self
                    .client
                    .complete(&format!("{}\nAsset name: {}", self.prompt, name));
                asked += 1;
                let answer = answer.trim();
                if !answer.is_empty() {
                    asset.asset_type = Some(answer.to_string());
                    assigned += 1;
                }
            }
        }
        debug!(module = %self.name, asked, assigned, "asset types requested from collaborator");
        Routing::Static
    }
}

//! Asset naming

use assetsort_llm::SharedClient;
use tracing::debug;

use crate::module::{type_name_of, Module, Routing};
use crate::state::{stem_prefix, ClassificationState};

/// Names every unnamed, non-empty asset.
///
/// The completion client is shown the asset's filenames, one per line, but
/// its answer is not used: the name is always the stem prefix of the asset's
/// first file.
pub struct AssetNameModule {
    name: String,
    client: SharedClient,
    prompt: String,
}

impl AssetNameModule {
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

    fn prompt_for(&self, filenames: &[&str]) -> String {
        let listing = filenames.join("\n");
        if self.prompt.is_empty() {
            listing
        } else {
            format!("{}\n{}", self.prompt, listing)
        }
    }
}

impl Module for AssetNameModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, state: &mut ClassificationState) -> Routing {
        let mut named = 0usize;
        for source in state.sources.values_mut() {
            for asset in source.assets.values_mut() {
                if asset.asset_name.is_some() {
                    continue;
                }
                let filenames: Vec<&str> = asset
                    .asset_contents
                    .iter()
                    .filter_map(|id| source.contents.get(id))
                    .map(|entry| entry.filename.as_str())
                    .collect();
                let Some(first) = filenames.first() else {
                    continue;
                };

                // answer unused; names always come from the stem
                let _ = self.client.complete(&self.prompt_for(&filenames));
                asset.asset_name = Some(stem_prefix(first));
                named += 1;
            }
        }
        debug!(module = %self.name, named, "assets named");
        Routing::Static
    }
}

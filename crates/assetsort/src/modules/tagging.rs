//! Asset tagging

use assetsort_llm::SharedClient;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::module::{type_name_of, Module, Routing};
use crate::state::ClassificationState;

// Non-word characters and underscores
static TOKEN_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\W_]+").expect("constant pattern compiles"));

/// Split a comma-separated answer into trimmed, non-empty tags
fn split_answer(answer: &str) -> Vec<String> {
    answer
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tokenize a lower-cased asset name on non-word characters and underscores
fn tokenize_name(name: &str) -> Vec<String> {
    TOKEN_SEPARATOR
        .split(&name.to_lowercase())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tags every asset that has no tags yet.
///
/// A non-empty answer from the completion client is split on commas;
/// otherwise the tags are the tokens of the asset name.
pub struct TaggingModule {
    name: String,
    client: SharedClient,
    prompt: String,
}

impl TaggingModule {
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

impl Module for TaggingModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, state: &mut ClassificationState) -> Routing {
        let mut tagged = 0usize;
        for source in state.sources.values_mut() {
            for asset in source.assets.values_mut() {
                if !asset.asset_tags.is_empty() {
                    continue;
                }
                let name = asset.asset_name.as_deref().unwrap_or_default();
                let prompt = format!("{}\nAsset name: {}", self.prompt, name);
                let answer = self.client.complete(prompt.trim());
                let answer = answer.trim();
                let tags = if answer.is_empty() {
                    tokenize_name(name)
                } else {
                    split_answer(answer)
                };
                if !tags.is_empty() {
                    tagged += 1;
                }
                asset.asset_tags.extend(tags);
            }
        }
        debug!(module = %self.name, tagged, "assets tagged");
        Routing::Static
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AssetEntry, DEFAULT_SOURCE_ID};
    use assetsort_llm::{noop_client, ScriptedClient};
    use std::sync::Arc;

    fn with_names(names: &[Option<&str>]) -> ClassificationState {
        let mut state = ClassificationState::from_file_list(Vec::<String>::new());
        let source = state.sources.get_mut(DEFAULT_SOURCE_ID).unwrap();
        for name in names {
            source.add_asset(AssetEntry {
                asset_name: name.map(str::to_string),
                ..AssetEntry::default()
            });
        }
        state
    }

    fn tags(state: &ClassificationState) -> Vec<Vec<String>> {
        state.sources[DEFAULT_SOURCE_ID]
            .assets
            .values()
            .map(|a| a.asset_tags.clone())
            .collect()
    }

    #[test]
    fn test_tokenize_name() {
        assert_eq!(tokenize_name("Old-Oak_Planks 02"), vec!["old", "oak", "planks", "02"]);
        assert_eq!(tokenize_name("__wood__"), vec!["wood"]);
        assert!(tokenize_name("").is_empty());
        assert!(tokenize_name("--").is_empty());
    }

    #[test]
    fn test_split_answer() {
        assert_eq!(split_answer(" wood, oak ,, planks "), vec!["wood", "oak", "planks"]);
    }

    #[test]
    fn test_fallback_tags_from_name() {
        let module = TaggingModule::new(noop_client(), "");
        assert_eq!(module.name(), "TaggingModule");

        let mut state = with_names(&[Some("Oak_Planks"), None]);
        module.run(&mut state);
        assert_eq!(tags(&state), vec![vec!["oak".to_string(), "planks".to_string()], vec![]]);
    }

    #[test]
    fn test_collaborator_tags_preferred() {
        let client = Arc::new(ScriptedClient::with_answers(["wood, floor", ""]));
        let module = TaggingModule::new(client.clone(), "Suggest tags");

        let mut state = with_names(&[Some("oak"), Some("rock_big")]);
        module.run(&mut state);
        assert_eq!(
            tags(&state),
            vec![
                vec!["wood".to_string(), "floor".to_string()],
                vec!["rock".to_string(), "big".to_string()],
            ]
        );
        assert_eq!(client.prompts()[0], "Suggest tags\nAsset name: oak");
    }

    #[test]
    fn test_prompt_is_trimmed_without_instruction() {
        let client = Arc::new(ScriptedClient::new());
        let module = TaggingModule::new(client.clone(), "");
        let mut state = with_names(&[Some("mesh")]);
        module.run(&mut state);
        assert_eq!(client.prompts(), vec!["Asset name: mesh".to_string()]);
    }

    #[test]
    fn test_tagged_assets_untouched() {
        let client = Arc::new(ScriptedClient::new());
        let module = TaggingModule::new(client.clone(), "");
        let mut state = with_names(&[Some("mesh")]);
        state.sources[DEFAULT_SOURCE_ID].assets["0"].asset_tags = vec!["hero".to_string()];

        module.run(&mut state);
        module.run(&mut state);
        assert_eq!(tags(&state), vec![vec!["hero".to_string()]]);
        assert_eq!(client.calls(), 0);
    }
}

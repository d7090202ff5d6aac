//! Collaborator-assisted filetype resolution

use assetsort_llm::SharedClient;
use tracing::debug;

use crate::module::{type_name_of, Module, Routing};
use crate::state::ClassificationState;

/// Asks the completion client for the filetype of every unresolved file
pub struct LlmFiletypeModule {
    name: String,
    client: SharedClient,
    prompt: String,
}

impl LlmFiletypeModule {
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

    fn prompt_for(&self, filename: &str) -> String {
        format!("{}\nFilename: {}", self.prompt, filename)
    }
}

impl Module for LlmFiletypeModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, state: &mut ClassificationState) -> Routing {
        let mut asked = 0usize;
        let mut assigned = 0usize;
        for source in state.sources.values_mut() {
            for entry in source.contents.values_mut() {
                if entry.is_classified() {
                    continue;
                }
                asked += 1;
                let answer = self.client.complete(&self.prompt_for(&entry.filename));
                let answer = answer.trim();
                if !answer.is_empty() {
                    entry.filetype = Some(answer.to_string());
                    assigned += 1;
                }
            }
        }
        debug!(module = %self.name, asked, assigned, "filetypes requested from collaborator");
        Routing::Static
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DEFAULT_SOURCE_ID;
    use assetsort_llm::{LlmError, ScriptedClient};
    use std::sync::Arc;

    #[test]
    fn test_answers_fill_unresolved_filetypes() {
        let client = Arc::new(ScriptedClient::with_answers(["  MAP_ROUGH \n", ""]));
        let module = LlmFiletypeModule::new(client.clone(), "Classify this file");
        assert_eq!(module.name(), "LlmFiletypeModule");

        let mut state = ClassificationState::from_file_list(["wood_col.png", "wood_r.png", "notes.txt"]);
        state.sources[DEFAULT_SOURCE_ID].contents["0"].filetype = Some("MAP_COL".to_string());
        module.run(&mut state);

        let contents = &state.sources[DEFAULT_SOURCE_ID].contents;
        assert_eq!(contents["0"].filetype.as_deref(), Some("MAP_COL"));
        assert_eq!(contents["1"].filetype.as_deref(), Some("MAP_ROUGH"));
        assert_eq!(contents["2"].filetype, None);
        assert_eq!(
            client.prompts(),
            vec![
                "Classify this file\nFilename: wood_r.png".to_string(),
                "Classify this file\nFilename: notes.txt".to_string(),
            ]
        );
    }

    #[test]
    fn test_failure_leaves_file_unresolved() {
        let client = Arc::new(ScriptedClient::new());
        client.push_failure(LlmError::Timeout);
        let module = LlmFiletypeModule::new(client.clone(), "");

        let mut state = ClassificationState::from_file_list(["mystery.bin"]);
        module.run(&mut state);
        assert_eq!(state.sources[DEFAULT_SOURCE_ID].contents["0"].filetype, None);
        assert_eq!(client.calls(), 1);
    }

    #[test]
    fn test_resolved_files_are_not_asked_about() {
        let client = Arc::new(ScriptedClient::with_answers(["FIRST", "SECOND"]));
        let module = LlmFiletypeModule::new(client.clone(), "");

        let mut state = ClassificationState::from_file_list(["a.bin"]);
        module.run(&mut state);
        module.run(&mut state);
        assert_eq!(
            state.sources[DEFAULT_SOURCE_ID].contents["0"].filetype.as_deref(),
            Some("FIRST")
        );
        assert_eq!(client.calls(), 1);
    }
}

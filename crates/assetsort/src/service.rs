//! The standard classification graph, wired from a [`LibraryConfig`]

use assetsort_llm::{create_client, noop_client, SharedClient};
use tracing::{debug, info, warn};

use crate::config::LibraryConfig;
use crate::error::Result;
use crate::module::Module;
use crate::modules::{
    AssetNameModule, AssignConstantsModule, AssignStandaloneNameModule, GroupFilesModule,
    KeywordAssetTypeModule, LlmAssetTypeModule, LlmFiletypeModule, OutputModule,
    RuleBasedFileTypeModule, SeparateStandaloneModule, TaggingModule,
};
use crate::pipeline::{Completion, Pipeline, RunReport};
use crate::state::ClassificationState;

/// Builds and runs the standard pipeline.
///
/// ```text
/// AssignConstants → RuleBasedFileType ─┬→ LlmFiletype ─┐
///                                      └───────────────┴→ SeparateStandalone
/// SeparateStandalone ─┬→ AssignStandaloneName ─────────────────┐
///                     └→ GroupFiles → AssetName ───────────────┴→ KeywordAssetType
/// KeywordAssetType ─┬→ LlmAssetType ─┐
///                   └────────────────┴→ Tagging → Output
/// ```
///
/// The rule stages skip their collaborator fallback when every item resolved,
/// and standalone separation only activates the branches it has work for.
pub struct ClassificationService {
    pipeline: Pipeline,
}

impl ClassificationService {
    /// Wire the graph for `config`.
    ///
    /// Without an injected `client`, one is built from the active provider
    /// profile; if that fails the service runs without a collaborator.
    pub fn new(config: &LibraryConfig, client: Option<SharedClient>) -> Result<Self> {
        let client = client.unwrap_or_else(|| client_from_config(config));
        let prompts = &config.classification.prompts;
        let asset_types = config.merged_asset_types();

        let constants = AssignConstantsModule::new(&config.classification.keyword_rules);
        let llm_filetype = LlmFiletypeModule::new(client.clone(), &prompts.filetype);
        let group = GroupFilesModule::new();
        let asset_name = AssetNameModule::new(client.clone(), &prompts.naming);
        let llm_asset_type = LlmAssetTypeModule::new(client.clone(), &prompts.asset_type);
        let tagging = TaggingModule::new(client, &prompts.tagging);
        let output = OutputModule::new();

        let keyword_type = KeywordAssetTypeModule::new(&asset_types)
            .with_fallback(llm_asset_type.name(), [tagging.name()]);
        let assign_name = AssignStandaloneNameModule::new().with_next(keyword_type.name());
        let separate = SeparateStandaloneModule::new(&config.file_types)
            .with_routing(assign_name.name(), group.name());
        let rules = RuleBasedFileTypeModule::new(&config.file_types)
            .with_fallback(llm_filetype.name(), [separate.name()]);

        let constants_name = constants.name().to_string();
        let rules_name = rules.name().to_string();
        let llm_filetype_name = llm_filetype.name().to_string();
        let separate_name = separate.name().to_string();
        let assign_name_name = assign_name.name().to_string();
        let group_name = group.name().to_string();
        let asset_name_name = asset_name.name().to_string();
        let keyword_type_name = keyword_type.name().to_string();
        let llm_asset_type_name = llm_asset_type.name().to_string();
        let tagging_name = tagging.name().to_string();

        let mut pipeline = Pipeline::new();
        pipeline.register(constants, &[])?;
        pipeline.register(rules, &[constants_name.as_str()])?;
        pipeline.register(llm_filetype, &[rules_name.as_str()])?;
        pipeline.register(separate, &[rules_name.as_str(), llm_filetype_name.as_str()])?;
        pipeline.register(assign_name, &[separate_name.as_str()])?;
        pipeline.register(group, &[separate_name.as_str()])?;
        pipeline.register(asset_name, &[group_name.as_str()])?;
        pipeline.register(keyword_type, &[asset_name_name.as_str(), assign_name_name.as_str()])?;
        pipeline.register(llm_asset_type, &[keyword_type_name.as_str()])?;
        pipeline.register(tagging, &[keyword_type_name.as_str(), llm_asset_type_name.as_str()])?;
        pipeline.register(output, &[tagging_name.as_str()])?;
        pipeline.validate()?;

        debug!(modules = pipeline.len(), "classification service ready");
        Ok(Self { pipeline })
    }

    /// Switch the completion policy of the underlying pipeline
    pub fn with_completion(mut self, completion: Completion) -> Self {
        self.pipeline = std::mem::take(&mut self.pipeline).with_completion(completion);
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()
    }

    /// Run the graph over `state`
    pub fn classify(&self, mut state: ClassificationState) -> Result<ClassificationState> {
        self.classify_with_report(&mut state)?;
        Ok(state)
    }

    /// Run the graph over `state` in place
    pub fn classify_with_report(&self, state: &mut ClassificationState) -> Result<RunReport> {
        let report = self.pipeline.run_with_report(state)?;
        let summary = state.summary();
        info!(
            files = summary.files,
            classified = summary.classified_files,
            assets = summary.assets,
            unassigned = summary.unassigned_files,
            "classification finished"
        );
        let violations = state.membership_violations();
        if !violations.is_empty() {
            warn!(count = violations.len(), "files belong to more than one asset");
        }
        Ok(report)
    }

    /// Single-source state for an ordered list of filenames
    pub fn from_file_list<I, S>(files: I) -> ClassificationState
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ClassificationState::from_file_list(files)
    }
}

fn client_from_config(config: &LibraryConfig) -> SharedClient {
    let Some(profile) = config.active_provider_profile() else {
        debug!("no provider profile configured, running without collaborator");
        return noop_client();
    };
    match create_client(profile) {
        Ok(client) => {
            info!(profile = %profile.profile_name, backend = client.name(), "completion client ready");
            client
        }
        Err(err) => {
            warn!(
                profile = %profile.profile_name,
                error = %err,
                "could not build completion client, running without collaborator"
            );
            noop_client()
        }
    }
}

//! End-to-end tests for the classification pipeline
//!
//! These drive the engine and the standard service graph through whole runs,
//! including snapshots taken between runs.

use assetsort::modules::{
    AssignConstantsModule, GroupFilesModule, LlmFiletypeModule, RuleBasedFileTypeModule,
};
use assetsort::{
    ClassificationService, ClassificationState, ClassifyError, FnModule, LibraryConfig, Module,
    Pipeline, Routing, DEFAULT_SOURCE_ID,
};
use assetsort_llm::{noop_client, ScriptedClient, SharedClient};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const LIBRARY: &str = r#"
[file_types.FILE_MODEL]
alias = "MODEL"
standalone = true
rule_keywords = ["_mdl"]

[file_types.MAP_COL]
alias = "COL"
rule_keywords = ["_col", "_albedo"]

[file_types.MAP_NRM]
alias = "NRM"
rule_keywords = ["_nrm"]

[asset_types.MODEL]
rule_keywords = ["mesh"]

[asset_types.TEXTURE]
rule_keywords = ["wood"]

[classification]
keyword_rules = { ".fbx" = "FILE_MODEL", "readme" = "IGNORE" }
asset_type_keywords = { TEXTURE = ["stone"] }
"#;

/// Temp directory holding a library catalog and snapshots
struct TestEnv {
    _temp: TempDir,
    root: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let root = temp.path().to_path_buf();
        fs::write(root.join("library.toml"), LIBRARY).expect("Failed to write library");
        Self { _temp: temp, root }
    }

    fn config(&self) -> LibraryConfig {
        LibraryConfig::load(&self.root.join("library.toml")).expect("Failed to load library")
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

type Log = Arc<Mutex<Vec<String>>>;

fn recorder(name: &'static str, log: &Log) -> impl Module {
    let log = Arc::clone(log);
    FnModule::new(name, move |_state: &mut ClassificationState| {
        log.lock().unwrap().push(name.to_string());
        Routing::Static
    })
}

fn filetype_of(state: &ClassificationState, file_id: &str) -> Option<String> {
    state.sources[DEFAULT_SOURCE_ID].contents[file_id].filetype.clone()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_rule_keywords_resolve_without_collaborator() {
    let client = Arc::new(ScriptedClient::new());
    let shared: SharedClient = client.clone();
    let fallback = LlmFiletypeModule::new(shared, "Classify");

    let mut pipeline = Pipeline::new();
    pipeline
        .register(
            RuleBasedFileTypeModule::from_keywords([("_col", "MAP_COL"), ("_nrm", "MAP_NRM")])
                .with_fallback(fallback.name(), Vec::<String>::new()),
            &[],
        )
        .unwrap();
    pipeline
        .register(fallback, &["RuleBasedFileTypeModule"])
        .unwrap();

    let state = pipeline
        .run(ClassificationState::from_file_list(["wood_col.png", "wood_nrm.png"]))
        .unwrap();

    assert_eq!(filetype_of(&state, "0").as_deref(), Some("MAP_COL"));
    assert_eq!(filetype_of(&state, "1").as_deref(), Some("MAP_NRM"));
    assert_eq!(client.calls(), 0);
}

#[test]
fn test_fallback_module_never_activated_when_rules_resolve_everything() {
    let log = Log::default();
    let mut pipeline = Pipeline::new();
    pipeline
        .register(
            RuleBasedFileTypeModule::from_keywords([("_col", "MAP_COL")])
                .with_fallback("Fallback", ["Done"]),
            &[],
        )
        .unwrap();
    pipeline
        .register(recorder("Fallback", &log), &["RuleBasedFileTypeModule"])
        .unwrap();
    pipeline
        .register(recorder("Done", &log), &["RuleBasedFileTypeModule", "Fallback"])
        .unwrap();

    let mut resolved = ClassificationState::from_file_list(["a_col.png", "b_col.png"]);
    let report = pipeline.run_with_report(&mut resolved).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["Done"]);
    assert_eq!(report.pruned, vec!["Fallback"]);

    log.lock().unwrap().clear();
    let mut partial = ClassificationState::from_file_list(["a_col.png", "b.txt"]);
    let report = pipeline.run_with_report(&mut partial).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["Fallback", "Done"]);
    assert!(report.pruned.is_empty());
}

#[test]
fn test_standalone_model_and_grouped_textures() {
    let env = TestEnv::new();
    let service = ClassificationService::new(&env.config(), Some(noop_client())).unwrap();

    let state = service
        .classify(ClassificationService::from_file_list([
            "mesh_mdl.fbx",
            "mesh_col.png",
            "mesh_nrm.png",
        ]))
        .unwrap();

    let assets = &state.sources[DEFAULT_SOURCE_ID].assets;
    assert_eq!(assets.len(), 2);
    let contents: Vec<BTreeSet<&str>> = assets
        .values()
        .map(|a| a.asset_contents.iter().map(String::as_str).collect())
        .collect();
    assert!(contents.contains(&BTreeSet::from(["0"])));
    assert!(contents.contains(&BTreeSet::from(["1", "2"])));
    for asset in assets.values() {
        assert_eq!(asset.asset_name.as_deref(), Some("mesh"));
        assert_eq!(asset.asset_type.as_deref(), Some("MODEL"));
        assert_eq!(asset.asset_tags, vec!["mesh"]);
    }
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_every_file_in_at_most_one_asset() {
    let env = TestEnv::new();
    let service = ClassificationService::new(&env.config(), Some(noop_client())).unwrap();

    let state = service
        .classify(ClassificationService::from_file_list([
            "crate_mdl.fbx",
            "crate_col.png",
            "props/crate_col.png",
            "props/crate_nrm.png",
            "readme.txt",
            "stone_albedo.png",
            "rock.obj",
        ]))
        .unwrap();

    assert!(state.membership_violations().is_empty());
    assert!(state.dangling_references().is_empty());
    assert_eq!(state.summary().unassigned_files, 0);
}

#[test]
fn test_repeated_runs_are_deterministic() {
    let env = TestEnv::new();
    let files = [
        "wood_col.png",
        "mesh_mdl.fbx",
        "wood_nrm.png",
        "stone_albedo.png",
        "extra/wood_col.png",
    ];

    let first = ClassificationService::new(&env.config(), Some(noop_client()))
        .unwrap()
        .classify(ClassificationService::from_file_list(files))
        .unwrap();
    let second = ClassificationService::new(&env.config(), Some(noop_client()))
        .unwrap()
        .classify(ClassificationService::from_file_list(files))
        .unwrap();

    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    let stone = first.sources[DEFAULT_SOURCE_ID]
        .assets
        .values()
        .find(|a| a.asset_name.as_deref() == Some("stone"))
        .unwrap();
    assert_eq!(stone.asset_type.as_deref(), Some("TEXTURE"));
}

#[test]
fn test_snapshot_between_stages_resumes_to_same_result() {
    let env = TestEnv::new();
    let config = env.config();
    let files = ["mesh_mdl.fbx", "wood_col.png", "wood_nrm.png", "notes.txt"];

    // filetype stage only, then persist
    let mut filetypes = Pipeline::new();
    filetypes
        .register(AssignConstantsModule::new(&config.classification.keyword_rules), &[])
        .unwrap();
    filetypes
        .register(
            RuleBasedFileTypeModule::new(&config.file_types),
            &["AssignConstantsModule"],
        )
        .unwrap();
    let partial = filetypes
        .run(ClassificationService::from_file_list(files))
        .unwrap();
    let snapshot = env.path("partial.json");
    partial.save(&snapshot).unwrap();

    let service = ClassificationService::new(&config, Some(noop_client())).unwrap();
    let resumed = service
        .classify(ClassificationState::load(&snapshot).unwrap())
        .unwrap();
    let direct = service
        .classify(ClassificationService::from_file_list(files))
        .unwrap();

    assert_eq!(resumed, direct);
    assert_eq!(ClassificationState::load(&snapshot).unwrap(), partial);
}

#[test]
fn test_sources_are_classified_independently() {
    let text = r#"{
        "sources": {
            "kit_a": {"metadata": {"supplier": "acme"}, "contents": {"0": {"filename": "wood_col.png"}, "1": {"filename": "wood_nrm.png"}}},
            "kit_b": {"contents": {"0": {"filename": "wood_col.png"}, "7": {"filename": "mesh_mdl.fbx"}}}
        }
    }"#;
    let env = TestEnv::new();
    let service = ClassificationService::new(&env.config(), Some(noop_client())).unwrap();
    let state = service
        .classify(ClassificationState::from_json(text).unwrap())
        .unwrap();

    let kit_a = &state.sources["kit_a"];
    assert_eq!(kit_a.assets.len(), 1);
    assert_eq!(kit_a.assets["0"].asset_contents, vec!["0", "1"]);
    assert_eq!(kit_a.metadata["supplier"], "acme");

    let kit_b = &state.sources["kit_b"];
    assert_eq!(kit_b.assets.len(), 2);
    assert_eq!(kit_b.assets["0"].asset_contents, vec!["7"]);
    assert_eq!(kit_b.assets["1"].asset_contents, vec!["0"]);
}

#[test]
fn test_collaborator_answers_flow_through_service() {
    let env = TestEnv::new();
    let client = Arc::new(ScriptedClient::with_answers([
        "MAP_ROUGH",                             // filetype for wood_r.png
        "<think>\nold boards\n</think>\nPlanks", // naming reply, ignored
        "wood, planks",
    ]));
    let shared: SharedClient = client.clone();
    let service = ClassificationService::new(&env.config(), Some(shared)).unwrap();

    let state = service
        .classify(ClassificationService::from_file_list(["wood_col.png", "wood_r.png"]))
        .unwrap();

    assert_eq!(filetype_of(&state, "1").as_deref(), Some("MAP_ROUGH"));
    let asset = &state.sources[DEFAULT_SOURCE_ID].assets["0"];
    assert_eq!(asset.asset_name.as_deref(), Some("wood"));
    assert_eq!(asset.asset_type.as_deref(), Some("TEXTURE"));
    assert_eq!(asset.asset_tags, vec!["wood", "planks"]);
    assert_eq!(client.calls(), 3);
}

#[test]
fn test_malformed_snapshot_fails_before_any_module_runs() {
    let env = TestEnv::new();
    let path = env.path("broken.json");
    fs::write(&path, "{\"sources\": {\"s\": {\"contents\": 3}}}").unwrap();

    let err = ClassificationState::load(&path).unwrap_err();
    assert!(matches!(err, ClassifyError::StateDecode(_)));
}

#[test]
fn test_snapshot_with_unknown_asset_file_is_rejected() {
    let env = TestEnv::new();
    let path = env.path("dangling.json");
    fs::write(
        &path,
        r#"{"sources": {"s": {"contents": {"0": {"filename": "wood_col.png"}}, "assets": {"0": {"asset_contents": ["7"]}}}}}"#,
    )
    .unwrap();

    let err = ClassificationState::load(&path).unwrap_err();
    assert!(matches!(err, ClassifyError::StateDecode(_)));
}

#[test]
fn test_grouping_only_pipeline_leaves_types_unset() {
    let mut pipeline = Pipeline::new();
    pipeline.register(GroupFilesModule::new(), &[]).unwrap();
    let state = pipeline
        .run(ClassificationState::from_file_list(["a_1.png", "a_2.png"]))
        .unwrap();
    let asset = &state.sources[DEFAULT_SOURCE_ID].assets["0"];
    assert_eq!(asset.asset_contents, vec!["0", "1"]);
    assert!(asset.asset_type.is_none());
    assert!(asset.asset_name.is_none());
}

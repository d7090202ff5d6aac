//! Heuristic grouping of leftover files

use indexmap::IndexMap;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::module::{type_name_of, Module, Routing};
use crate::state::{stem_prefix, AssetEntry, ClassificationState};

/// Groups files not yet in any asset by (parent directory, stem prefix).
///
/// One asset is created per distinct key, in the order keys are first seen.
pub struct GroupFilesModule {
    name: String,
}

impl GroupFilesModule {
    pub fn new() -> Self {
        Self {
            name: type_name_of::<Self>(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for GroupFilesModule {
    fn default() -> Self {
        Self::new()
    }
}

/// `(parent, stem prefix)`; `wood_col.png` and `./wood_col.png` share the parent `"."`
fn group_key(filename: &str) -> (String, String) {
    let parent: PathBuf = Path::new(filename)
        .parent()
        .map(|p| {
            p.components()
                .filter(|c| !matches!(c, Component::CurDir))
                .collect::<PathBuf>()
        })
        .unwrap_or_default();
    let parent = if parent.as_os_str().is_empty() {
        ".".to_string()
    } else {
        parent.to_string_lossy().into_owned()
    };
    (parent, stem_prefix(filename))
}

impl Module for GroupFilesModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, state: &mut ClassificationState) -> Routing {
        let mut created = 0usize;
        for source in state.sources.values_mut() {
            let mut groups: IndexMap<(String, String), Vec<String>> = IndexMap::new();
            for file_id in source.unassigned_file_ids() {
                if let Some(entry) = source.contents.get(&file_id) {
                    groups
                        .entry(group_key(&entry.filename))
                        .or_default()
                        .push(file_id);
                }
            }
            for (_, members) in groups {
                source.add_asset(AssetEntry::with_contents(members));
                created += 1;
            }
        }
        debug!(module = %self.name, created, "files grouped into assets");
        Routing::Static
    }
}

//! Standalone filetypes: one file, one asset

use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;

use crate::config::FileTypeDefinition;
use crate::module::{type_name_of, Module, Routing};
use crate::state::{stem_prefix, AssetEntry, ClassificationState};

/// Gives every unassigned file of a standalone filetype its own asset.
///
/// Files without a filetype, or with a non-standalone one, are left for
/// grouping. With routing configured the module activates
/// `standalone_next` when it created an asset and `grouping_next` when files
/// still need grouping.
pub struct SeparateStandaloneModule {
    name: String,
    standalone_types: HashSet<String>,
    standalone_next: Option<String>,
    grouping_next: Option<String>,
}

impl SeparateStandaloneModule {
    pub fn new(definitions: &IndexMap<String, FileTypeDefinition>) -> Self {
        Self {
            name: type_name_of::<Self>(),
            standalone_types: definitions
                .iter()
                .filter(|(_, def)| def.standalone)
                .map(|(filetype, _)| filetype.clone())
                .collect(),
            standalone_next: None,
            grouping_next: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_routing(
        mut self,
        standalone_next: impl Into<String>,
        grouping_next: impl Into<String>,
    ) -> Self {
        self.standalone_next = Some(standalone_next.into());
        self.grouping_next = Some(grouping_next.into());
        self
    }

    fn is_standalone(&self, filetype: Option<&str>) -> bool {
        filetype.is_some_and(|t| self.standalone_types.contains(t))
    }
}

impl Module for SeparateStandaloneModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, state: &mut ClassificationState) -> Routing {
        let mut created = 0usize;
        let mut needs_grouping = false;

        for source in state.sources.values_mut() {
            let assigned = source.assigned_file_ids();
            let mut standalone = Vec::new();
            for (file_id, entry) in &source.contents {
                if assigned.contains(file_id) {
                    continue;
                }
                if self.is_standalone(entry.filetype.as_deref()) {
                    standalone.push(file_id.clone());
                } else {
                    needs_grouping = true;
                }
            }
            for file_id in standalone {
                source.add_asset(AssetEntry::with_contents(vec![file_id]));
                created += 1;
            }
        }
        debug!(module = %self.name, created, needs_grouping, "standalone files separated");

        let mut next = Vec::new();
        if created > 0 {
            next.extend(self.standalone_next.iter().cloned());
        }
        if needs_grouping {
            next.extend(self.grouping_next.iter().cloned());
        }
        if next.is_empty() {
            Routing::Static
        } else {
            Routing::Explicit(next)
        }
    }
}

/// Names unnamed single-file assets after their file's stem prefix
pub struct AssignStandaloneNameModule {
    name: String,
    next_module: Option<String>,
}

impl AssignStandaloneNameModule {
    pub fn new() -> Self {
        Self {
            name: type_name_of::<Self>(),
            next_module: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Route only to `next` once no file is left unassigned
    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next_module = Some(next.into());
        self
    }
}

impl Default for AssignStandaloneNameModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for AssignStandaloneNameModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, state: &mut ClassificationState) -> Routing {
        let mut named = 0usize;
        let mut has_unassigned = false;

        for source in state.sources.values_mut() {
            has_unassigned |= source.has_unassigned_files();
            for asset in source.assets.values_mut() {
                if asset.asset_name.is_some() {
                    continue;
                }
                let [file_id] = asset.asset_contents.as_slice() else {
                    continue;
                };
                if let Some(entry) = source.contents.get(file_id) {
                    asset.asset_name = Some(stem_prefix(&entry.filename));
                    named += 1;
                }
            }
        }
        debug!(module = %self.name, named, has_unassigned, "standalone assets named");

        match &self.next_module {
            Some(next) if !has_unassigned => Routing::to([next.clone()]),
            _ => Routing::Static,
        }
    }
}

//! Classification state shared by every module
//!
//! One [`ClassificationState`] is created per run (from a file listing or a
//! persisted snapshot) and mutated in place by the modules of a pipeline.
//! All maps keep insertion order so that "file-iteration order" is the order
//! in which files were ingested or appear in the snapshot.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{ClassifyError, Result};

/// Source ID used by [`ClassificationState::from_file_list`]
pub const DEFAULT_SOURCE_ID: &str = "src";

/// One discovered file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub filename: String,

    /// Resolved filetype; first writer wins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filetype: Option<String>,
}

impl FileEntry {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            filetype: None,
        }
    }

    pub fn is_classified(&self) -> bool {
        self.filetype.is_some()
    }
}

/// A group of files forming one logical deliverable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_name: Option<String>,

    /// Unset while empty
    #[serde(default)]
    pub asset_tags: Vec<String>,

    /// File IDs of the owning source
    #[serde(default)]
    pub asset_contents: Vec<String>,
}

impl AssetEntry {
    pub fn with_contents(asset_contents: Vec<String>) -> Self {
        Self {
            asset_contents,
            ..Self::default()
        }
    }
}

/// Files and assets of one ingested source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceData {
    #[serde(default)]
    pub metadata: IndexMap<String, serde_json::Value>,

    #[serde(default)]
    pub contents: IndexMap<String, FileEntry>,

    #[serde(default)]
    pub assets: IndexMap<String, AssetEntry>,
}

impl SourceData {
    /// Smallest non-negative integer (as a string) not used as an asset ID
    pub fn next_asset_id(&self) -> String {
        smallest_unused_id(|id| self.assets.contains_key(id))
    }

    /// Smallest non-negative integer (as a string) not used as a file ID
    pub fn next_file_id(&self) -> String {
        smallest_unused_id(|id| self.contents.contains_key(id))
    }

    /// Insert `asset` under a freshly allocated ID and return that ID
    pub fn add_asset(&mut self, asset: AssetEntry) -> String {
        let id = self.next_asset_id();
        self.assets.insert(id.clone(), asset);
        id
    }

    /// Insert a file under a freshly allocated ID and return that ID
    pub fn add_file(&mut self, filename: impl Into<String>) -> String {
        let id = self.next_file_id();
        self.contents.insert(id.clone(), FileEntry::new(filename));
        id
    }

    /// IDs of files referenced by at least one asset
    pub fn assigned_file_ids(&self) -> HashSet<String> {
        self.assets
            .values()
            .flat_map(|asset| asset.asset_contents.iter().cloned())
            .collect()
    }

    /// IDs of files not referenced by any asset, in file-iteration order
    pub fn unassigned_file_ids(&self) -> Vec<String> {
        let assigned = self.assigned_file_ids();
        self.contents
            .keys()
            .filter(|id| !assigned.contains(*id))
            .cloned()
            .collect()
    }

    pub fn has_unassigned_files(&self) -> bool {
        let assigned = self.assigned_file_ids();
        self.contents.keys().any(|id| !assigned.contains(id))
    }
}

fn smallest_unused_id(in_use: impl Fn(&str) -> bool) -> String {
    (0u64..)
        .map(|n| n.to_string())
        .find(|candidate| !in_use(candidate))
        .unwrap_or_default()
}

/// Stem of `filename` up to its first underscore (`"dir/wood_col.png"` → `"wood"`)
pub fn stem_prefix(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.split('_').next().unwrap_or_default().to_string()
}

/// A file referenced by more than one asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipViolation {
    pub source_id: String,
    pub file_id: String,
    pub asset_ids: Vec<String>,
}

/// An asset content entry pointing at a file ID its source does not have
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub source_id: String,
    pub asset_id: String,
    pub file_id: String,
}

/// Counters describing how far classification got
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateSummary {
    pub sources: usize,
    pub files: usize,
    pub classified_files: usize,
    pub unassigned_files: usize,
    pub assets: usize,
    pub named_assets: usize,
    pub typed_assets: usize,
    pub tagged_assets: usize,
}

/// Root aggregate threaded through a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationState {
    #[serde(default)]
    pub sources: IndexMap<String, SourceData>,
}

impl ClassificationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a single-source state from an ordered list of filenames.
    ///
    /// Files get IDs `"0"`, `"1"`, ... in list order under [`DEFAULT_SOURCE_ID`].
    pub fn from_file_list<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let contents = files
            .into_iter()
            .enumerate()
            .map(|(idx, filename)| (idx.to_string(), FileEntry::new(filename)))
            .collect();
        let source = SourceData {
            contents,
            ..SourceData::default()
        };
        let mut sources = IndexMap::new();
        sources.insert(DEFAULT_SOURCE_ID.to_string(), source);
        Self { sources }
    }

    /// Parse a JSON snapshot.
    ///
    /// Asset contents must name files of the same source; a snapshot with
    /// dangling references is rejected as undecodable.
    pub fn from_json(text: &str) -> Result<Self> {
        let state: Self = serde_json::from_str(text).map_err(ClassifyError::StateDecode)?;
        if let Some(first) = state.dangling_references().first() {
            return Err(ClassifyError::StateDecode(serde::de::Error::custom(format!(
                "asset '{}' in source '{}' references unknown file '{}'",
                first.asset_id, first.source_id, first.file_id
            ))));
        }
        Ok(state)
    }

    /// Render a pretty-printed JSON snapshot
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(ClassifyError::StateEncode)
    }

    /// Load a JSON snapshot from disk
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Write a JSON snapshot to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Files referenced by more than one asset of their source
    pub fn membership_violations(&self) -> Vec<MembershipViolation> {
        let mut violations = Vec::new();
        for (source_id, source) in &self.sources {
            let mut owners: IndexMap<&str, Vec<String>> = IndexMap::new();
            for (asset_id, asset) in &source.assets {
                for file_id in &asset.asset_contents {
                    let entry = owners.entry(file_id.as_str()).or_default();
                    if !entry.contains(asset_id) {
                        entry.push(asset_id.clone());
                    }
                }
            }
            for (file_id, asset_ids) in owners {
                if asset_ids.len() > 1 {
                    violations.push(MembershipViolation {
                        source_id: source_id.clone(),
                        file_id: file_id.to_string(),
                        asset_ids,
                    });
                }
            }
        }
        violations
    }

    /// Asset contents pointing at file IDs missing from their source
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut dangling = Vec::new();
        for (source_id, source) in &self.sources {
            for (asset_id, asset) in &source.assets {
                for file_id in &asset.asset_contents {
                    if !source.contents.contains_key(file_id) {
                        dangling.push(DanglingReference {
                            source_id: source_id.clone(),
                            asset_id: asset_id.clone(),
                            file_id: file_id.clone(),
                        });
                    }
                }
            }
        }
        dangling
    }

    pub fn summary(&self) -> StateSummary {
        let mut summary = StateSummary {
            sources: self.sources.len(),
            ..StateSummary::default()
        };
        for source in self.sources.values() {
            summary.files += source.contents.len();
            summary.classified_files += source
                .contents
                .values()
                .filter(|f| f.is_classified())
                .count();
            summary.unassigned_files += source.unassigned_file_ids().len();
            summary.assets += source.assets.len();
            for asset in source.assets.values() {
                summary.named_assets += usize::from(asset.asset_name.is_some());
                summary.typed_assets += usize::from(asset.asset_type.is_some());
                summary.tagged_assets += usize::from(!asset.asset_tags.is_empty());
            }
        }
        summary
    }

    /// Per-file asset ownership, used by reports: `(source, file) -> asset`
    pub fn file_owners(&self) -> HashMap<(String, String), String> {
        let mut owners = HashMap::new();
        for (source_id, source) in &self.sources {
            for (asset_id, asset) in &source.assets {
                for file_id in &asset.asset_contents {
                    owners
                        .entry((source_id.clone(), file_id.clone()))
                        .or_insert_with(|| asset_id.clone());
                }
            }
        }
        owners
    }
}

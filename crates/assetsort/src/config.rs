//! Library catalog configuration
//!
//! Reads the filetype and asset-type catalogs plus classification settings
//! from `library.toml` (by default `~/.assetsort/library.toml`). Table order
//! is preserved: the order definitions appear in the file is the order rule
//! keywords are tried in.

use assetsort_llm::ProviderProfile;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ClassifyError, Result};

/// One recognised filetype
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTypeDefinition {
    /// Short label used in output filenames (e.g. "COL")
    pub alias: String,

    /// Files of this type form a complete asset by themselves
    #[serde(default)]
    pub standalone: bool,

    #[serde(default)]
    pub grayscale: bool,

    #[serde(default = "default_bit_depth_policy")]
    pub bit_depth_policy: String,

    /// Lower-cased substrings that identify this type, tried in order
    #[serde(default)]
    pub rule_keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_description: Option<String>,

    #[serde(default)]
    pub llm_examples: Vec<String>,
}

fn default_bit_depth_policy() -> String {
    "preserve".to_string()
}

impl FileTypeDefinition {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            standalone: false,
            grayscale: false,
            bit_depth_policy: default_bit_depth_policy(),
            rule_keywords: Vec::new(),
            llm_description: None,
            llm_examples: Vec::new(),
        }
    }

    pub fn standalone(mut self) -> Self {
        self.standalone = true;
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }
}

/// One recognised asset type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTypeDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    /// Lower-cased substrings of the asset name that identify this type
    #[serde(default)]
    pub rule_keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_description: Option<String>,

    #[serde(default)]
    pub llm_examples: Vec<String>,
}

impl AssetTypeDefinition {
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rule_keywords: keywords.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Instruction text prepended to collaborator prompts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationPrompts {
    #[serde(default)]
    pub filetype: String,

    #[serde(default)]
    pub asset_type: String,

    #[serde(default)]
    pub tagging: String,

    #[serde(default)]
    pub naming: String,
}

/// The `[classification]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationSettings {
    /// `profile_name` of the provider to use
    #[serde(default = "default_active_provider")]
    pub active_provider: String,

    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderProfile>,

    /// Ordered pattern → filetype constants; empty selects the built-in set
    #[serde(default)]
    pub keyword_rules: IndexMap<String, String>,

    /// Extra asset-type keywords merged into `[asset_types]`
    #[serde(default)]
    pub asset_type_keywords: IndexMap<String, Vec<String>>,

    #[serde(default)]
    pub prompts: ClassificationPrompts,
}

fn default_active_provider() -> String {
    ProviderProfile::default().profile_name
}

fn default_providers() -> Vec<ProviderProfile> {
    vec![ProviderProfile::default()]
}

impl Default for ClassificationSettings {
    fn default() -> Self {
        Self {
            active_provider: default_active_provider(),
            providers: default_providers(),
            keyword_rules: IndexMap::new(),
            asset_type_keywords: IndexMap::new(),
            prompts: ClassificationPrompts::default(),
        }
    }
}

impl ClassificationSettings {
    /// Profile named by `active_provider`, else the first configured one
    pub fn active_provider_profile(&self) -> Option<&ProviderProfile> {
        self.providers
            .iter()
            .find(|p| p.profile_name == self.active_provider)
            .or_else(|| self.providers.first())
    }
}

/// Root of `library.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default)]
    pub file_types: IndexMap<String, FileTypeDefinition>,

    #[serde(default)]
    pub asset_types: IndexMap<String, AssetTypeDefinition>,

    #[serde(default)]
    pub classification: ClassificationSettings,
}

impl LibraryConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ClassifyError::Config(e.to_string()))
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from the default location
    pub fn load_default() -> Result<Self> {
        Self::load(&default_config_path())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ClassifyError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Asset-type catalog with `classification.asset_type_keywords` folded in.
    ///
    /// Keywords for a known type extend its list; unknown types are appended.
    pub fn merged_asset_types(&self) -> IndexMap<String, AssetTypeDefinition> {
        let mut merged = self.asset_types.clone();
        for (asset_type, keywords) in &self.classification.asset_type_keywords {
            merged
                .entry(asset_type.clone())
                .or_default()
                .rule_keywords
                .extend(keywords.iter().cloned());
        }
        merged
    }

    pub fn active_provider_profile(&self) -> Option<&ProviderProfile> {
        self.classification.active_provider_profile()
    }
}

/// `~/.assetsort/library.toml`, honouring `ASSETSORT_HOME`
pub fn default_config_path() -> PathBuf {
    assetsort_logging::assetsort_home().join("library.toml")
}

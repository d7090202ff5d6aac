//! Keyword rules for filetypes and asset types
//!
//! Both modules flatten a catalog into an ordered keyword → type table
//! (definition order, then keyword order) and assign the type of the first
//! keyword found in the lower-cased file or asset name.

use indexmap::IndexMap;
use tracing::debug;

use super::{first_keyword_match, flatten_keywords, Fallback};
use crate::config::{AssetTypeDefinition, FileTypeDefinition};
use crate::module::{type_name_of, Module, Routing};
use crate::state::ClassificationState;

/// Assigns filetypes from the catalog's `rule_keywords`
pub struct RuleBasedFileTypeModule {
    name: String,
    keywords: IndexMap<String, String>,
    fallback: Option<Fallback>,
}

impl RuleBasedFileTypeModule {
    pub fn new(definitions: &IndexMap<String, FileTypeDefinition>) -> Self {
        Self::from_table(flatten_keywords(
            definitions
                .iter()
                .map(|(filetype, def)| (filetype, &def.rule_keywords)),
        ))
    }

    /// Build from an explicit ordered keyword → filetype table
    pub fn from_keywords<'a, I>(rules: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self::from_table(
            rules
                .into_iter()
                .map(|(keyword, filetype)| (keyword.to_lowercase(), filetype.to_string()))
                .collect(),
        )
    }

    fn from_table(keywords: IndexMap<String, String>) -> Self {
        Self {
            name: type_name_of::<Self>(),
            keywords,
            fallback: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Route to `next` only while files remain unresolved.
    ///
    /// `resolved_next` is activated either way; `next` must not be activated
    /// once every file has a filetype.
    pub fn with_fallback<I, S>(mut self, next: impl Into<String>, resolved_next: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback = Some(Fallback::new(next, resolved_next));
        self
    }
}

impl Module for RuleBasedFileTypeModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, state: &mut ClassificationState) -> Routing {
        let mut assigned = 0usize;
        let mut unresolved = 0usize;
        for source in state.sources.values_mut() {
            for entry in source.contents.values_mut() {
                if entry.is_classified() {
                    continue;
                }
                match first_keyword_match(&self.keywords, &entry.filename) {
                    Some(filetype) => {
                        entry.filetype = Some(filetype.to_string());
                        assigned += 1;
                    }
                    None => unresolved += 1,
                }
            }
        }
        debug!(module = %self.name, assigned, unresolved, "filetype rules applied");

        match &self.fallback {
            Some(fallback) => fallback.route(unresolved > 0),
            None => Routing::Static,
        }
    }
}

/// Assigns asset types by matching catalog keywords against asset names
pub struct KeywordAssetTypeModule {
    name: String,
    keywords: IndexMap<String, String>,
    fallback: Option<Fallback>,
}

impl KeywordAssetTypeModule {
    pub fn new(definitions: &IndexMap<String, AssetTypeDefinition>) -> Self {
        Self::from_table(flatten_keywords(
            definitions
                .iter()
                .map(|(asset_type, def)| (asset_type, &def.rule_keywords)),
        ))
    }

    pub fn from_keywords<'a, I>(rules: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self::from_table(
            rules
                .into_iter()
                .map(|(keyword, asset_type)| (keyword.to_lowercase(), asset_type.to_string()))
                .collect(),
        )
    }

    fn from_table(keywords: IndexMap<String, String>) -> Self {
        Self {
            name: type_name_of::<Self>(),
            keywords,
            fallback: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Route to `next` only while assets remain untyped
    pub fn with_fallback<I, S>(mut self, next: impl Into<String>, resolved_next: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback = Some(Fallback::new(next, resolved_next));
        self
    }
}

impl Module for KeywordAssetTypeModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, state: &mut ClassificationState) -> Routing {
        let mut assigned = 0usize;
        let mut unresolved = 0usize;
        for source in state.sources.values_mut() {
            for asset in source.assets.values_mut() {
                if asset.asset_type.is_some() {
                    continue;
                }
                let matched = asset
                    .asset_name
                    .as_deref()
                    .and_then(|name| first_keyword_match(&self.keywords, name));
                match matched {
                    Some(asset_type) => {
                        asset.asset_type = Some(asset_type.to_string());
                        assigned += 1;
                    }
                    None => unresolved += 1,
                }
            }
        }
        debug!(module = %self.name, assigned, unresolved, "asset type keywords applied");

        match &self.fallback {
            Some(fallback) => fallback.route(unresolved > 0),
            None => Routing::Static,
        }
    }
}

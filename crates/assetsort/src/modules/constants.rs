//! Constant filename patterns (extensions, fixed substrings)

use indexmap::IndexMap;
use tracing::debug;

use crate::module::{type_name_of, Module, Routing};
use crate::state::ClassificationState;

/// Patterns used when no constants are configured
pub const DEFAULT_CONSTANTS: &[(&str, &str)] = &[
    (".fbx", "FILE_MODEL"),
    (".obj", "FILE_MODEL"),
    (".sbsar", "FILE_SBSAR"),
];

/// Assigns filetypes from an ordered (pattern, filetype) list.
///
/// A file matches when its lower-cased name contains the lower-cased pattern
/// (suffix matches included). The first matching pattern wins.
pub struct AssignConstantsModule {
    name: String,
    patterns: Vec<(String, String)>,
}

impl AssignConstantsModule {
    /// Build from configured `keyword_rules`; an empty map selects [`DEFAULT_CONSTANTS`]
    pub fn new(rules: &IndexMap<String, String>) -> Self {
        if rules.is_empty() {
            Self::from_pairs(DEFAULT_CONSTANTS.iter().copied())
        } else {
            Self::from_pairs(rules.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        }
    }

    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self {
            name: type_name_of::<Self>(),
            patterns: pairs
                .into_iter()
                .map(|(pattern, filetype)| (pattern.to_lowercase(), filetype.to_string()))
                .collect(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn lookup(&self, filename: &str) -> Option<&str> {
        let filename = filename.to_lowercase();
        self.patterns
            .iter()
            .find(|(pattern, _)| filename.contains(pattern.as_str()))
            .map(|(_, filetype)| filetype.as_str())
    }
}

impl Default for AssignConstantsModule {
    fn default() -> Self {
        Self::new(&IndexMap::new())
    }
}

impl Module for AssignConstantsModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, state: &mut ClassificationState) -> Routing {
        let mut assigned = 0usize;
        for source in state.sources.values_mut() {
            for entry in source.contents.values_mut() {
                if entry.is_classified() {
                    continue;
                }
                if let Some(filetype) = self.lookup(&entry.filename) {
                    entry.filetype = Some(filetype.to_string());
                    assigned += 1;
                }
            }
        }
        debug!(module = %self.name, assigned, "constant patterns applied");
        Routing::Static
    }
}

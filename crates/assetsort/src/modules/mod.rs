//! Classification strategies
//!
//! Every strategy is a [`Module`](crate::Module) that visits each source
//! independently and leaves already-populated fields alone.
//!
//! | Stage | Modules |
//! |---|---|
//! | Filetypes | [`AssignConstantsModule`], [`RuleBasedFileTypeModule`], [`LlmFiletypeModule`] |
//! | Grouping | [`SeparateStandaloneModule`], [`GroupFilesModule`] |
//! | Naming | [`AssignStandaloneNameModule`], [`AssetNameModule`] |
//! | Asset types | [`KeywordAssetTypeModule`], [`LlmAssetTypeModule`] |
//! | Tags | [`TaggingModule`] |
//! | Terminal | [`OutputModule`] |

mod constants;
mod grouping;
mod llm_asset_type;
mod llm_filetype;
mod naming;
mod output;
mod rules;
mod standalone;
mod tagging;

pub use constants::{AssignConstantsModule, DEFAULT_CONSTANTS};
pub use grouping::GroupFilesModule;
pub use llm_asset_type::LlmAssetTypeModule;
pub use llm_filetype::LlmFiletypeModule;
pub use naming::AssetNameModule;
pub use output::OutputModule;
pub use rules::{KeywordAssetTypeModule, RuleBasedFileTypeModule};
pub use standalone::{AssignStandaloneNameModule, SeparateStandaloneModule};
pub use tagging::TaggingModule;

use indexmap::IndexMap;

use crate::module::Routing;

/// First value whose lower-cased key is contained in `haystack`
fn first_keyword_match<'a>(table: &'a IndexMap<String, String>, haystack: &str) -> Option<&'a str> {
    let haystack = haystack.to_lowercase();
    table
        .iter()
        .find(|(keyword, _)| haystack.contains(keyword.as_str()))
        .map(|(_, target)| target.as_str())
}

/// Flatten `(type, keywords)` pairs into an ordered keyword → type table.
///
/// A keyword seen twice keeps its first position and takes the later type.
fn flatten_keywords<'a, I>(definitions: I) -> IndexMap<String, String>
where
    I: IntoIterator<Item = (&'a String, &'a Vec<String>)>,
{
    let mut table = IndexMap::new();
    for (target, keywords) in definitions {
        for keyword in keywords {
            table.insert(keyword.to_lowercase(), target.clone());
        }
    }
    table
}

/// Routing for a rule stage with an optional fallback stage.
///
/// With unresolved items the fallback runs together with `resolved_next`;
/// once everything resolved only `resolved_next` is activated.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fallback {
    next: String,
    resolved_next: Vec<String>,
}

impl Fallback {
    fn new<I, S>(next: impl Into<String>, resolved_next: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            next: next.into(),
            resolved_next: resolved_next.into_iter().map(Into::into).collect(),
        }
    }

    fn route(&self, unresolved: bool) -> Routing {
        if unresolved {
            Routing::to(std::iter::once(self.next.clone()).chain(self.resolved_next.iter().cloned()))
        } else {
            Routing::to(self.resolved_next.iter().cloned())
        }
    }
}

use tracing::debug;

use crate::module::{type_name_of, Module, Routing};
use crate::state::ClassificationState;

/// Terminal module; leaves the state as it is
pub struct OutputModule {
    name: String,
}

impl OutputModule {
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

impl Default for OutputModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for OutputModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, state: &mut ClassificationState) -> Routing {
        debug!(module = %self.name, summary = ?state.summary(), "classification reached output");
        Routing::Static
    }
}

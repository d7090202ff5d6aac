//! The contract every classification strategy implements

use crate::state::ClassificationState;

/// What a module wants the engine to activate after it finishes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Routing {
    /// Follow the statically declared graph edges
    #[default]
    Static,
    /// Activate exactly these modules next, ignoring the static edges for this run
    Explicit(Vec<String>),
}

impl Routing {
    /// Explicit routing to the given module names
    pub fn to<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Routing::Explicit(names.into_iter().map(Into::into).collect())
    }
}

/// A classification strategy
///
/// Modules must be idempotent with respect to populated fields: running one
/// on a state whose target fields are already set leaves those fields alone.
pub trait Module: Send + Sync {
    /// Unique name within a pipeline
    fn name(&self) -> &str;

    /// Mutate `state` in place and decide what runs next
    fn run(&self, state: &mut ClassificationState) -> Routing;
}

/// Default module name: the unqualified type name of `T`
pub fn type_name_of<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Module built from a closure, mostly useful for routers and tests
pub struct FnModule<F> {
    name: String,
    func: F,
}

impl<F> FnModule<F>
where
    F: Fn(&mut ClassificationState) -> Routing + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Module for FnModule<F>
where
    F: Fn(&mut ClassificationState) -> Routing + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, state: &mut ClassificationState) -> Routing {
        (self.func)(state)
    }
}

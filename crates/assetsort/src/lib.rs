//! Assetsort - Asset Classification Pipeline
//!
//! Assetsort turns a flat listing of discovered files into assets: groups of
//! files with a type, a name and tags. Classification runs as a graph of small
//! modules over one shared [`ClassificationState`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────────────────────┐     ┌─────────────┐
//! │  File list  │     │             Pipeline             │     │  Snapshot   │
//! │ or snapshot │────▶│ filetypes → grouping → naming →  │────▶│   (JSON)    │
//! │             │     │ asset types → tags → output      │     │             │
//! └─────────────┘     └──────────────────────────────────┘     └─────────────┘
//!                                      │ prompts
//!                                      ▼
//!                            ┌───────────────────┐
//!                            │ CompletionClient  │  ("" = use local heuristic)
//!                            └───────────────────┘
//! ```
//!
//! # Core Concepts
//!
//! - **Module**: one classification strategy; mutates the state and returns a [`Routing`]
//! - **Routing**: follow the static edges, or activate an explicit subset of successors
//! - **Pipeline**: named modules plus static "runs after" edges, executed once each
//! - **Pruned**: a module none of whose predecessors activated it; it never runs
//! - **LibraryConfig**: the filetype and asset-type catalogs driving the rule modules

pub mod config;
pub mod error;
pub mod module;
pub mod modules;
pub mod pipeline;
pub mod service;
pub mod state;

// Re-exports for convenience
pub use config::{
    AssetTypeDefinition, ClassificationPrompts, ClassificationSettings, FileTypeDefinition,
    LibraryConfig,
};
pub use error::{ClassifyError, Result};
pub use module::{type_name_of, FnModule, Module, Routing};
pub use pipeline::{Completion, Pipeline, RunReport};
pub use service::ClassificationService;
pub use state::{
    stem_prefix, AssetEntry, ClassificationState, DanglingReference, FileEntry,
    MembershipViolation, SourceData, StateSummary, DEFAULT_SOURCE_ID,
};

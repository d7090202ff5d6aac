//! Error types for classification runs

use std::io;
use thiserror::Error;

/// Classification error type
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Module '{0}' is already registered")]
    DuplicateModule(String),

    #[error("Unknown module '{name}' referenced by '{referenced_by}'")]
    UnknownModule { name: String, referenced_by: String },

    #[error("Routing cycle: {0}")]
    RoutingCycle(String),

    #[error("Module '{from}' routed to '{to}', which is not one of its successors")]
    UndeclaredRoute { from: String, to: String },

    #[error("Strict run left modules unexecuted: {}", .0.join(", "))]
    IncompleteRun(Vec<String>),

    #[error("Failed to decode classification state: {0}")]
    StateDecode(#[source] serde_json::Error),

    #[error("Failed to encode classification state: {0}")]
    StateEncode(#[source] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ClassifyError>;

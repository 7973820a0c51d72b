use thiserror::Error;

use crate::dom::selector::SelectorError;

pub type Result<T> = std::result::Result<T, GroundingError>;

#[derive(Debug, Error)]
pub enum GroundingError {
    /// Identifier does not resolve to any attached element.
    #[error("no element with id '{id}' in the current snapshot")]
    NotFound { id: String },

    /// Operation requested on an element that cannot support it.
    #[error("unable to {operation} on a <{tag}> element")]
    UnsupportedTarget { operation: String, tag: String },

    #[error("invalid selector: {0}")]
    Selector(#[from] SelectorError),

    /// Render tree dump could not be parsed.
    #[error("snapshot parse error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Tree mutation that would corrupt the document.
    #[error("hierarchy error: {0}")]
    Hierarchy(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// The actuator reported a failure.
    #[error("actuation failed: {0}")]
    Actuation(String),
}

impl GroundingError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn unsupported(operation: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::UnsupportedTarget {
            operation: operation.into(),
            tag: tag.into(),
        }
    }
}

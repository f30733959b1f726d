//! Error types for topology construction and synthesis

use thiserror::Error;

/// Errors raised while composing, validating or synthesizing a topology
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    /// A path template could not be parsed
    #[error("Invalid path template '{path}': {reason}")]
    InvalidPathTemplate { path: String, reason: String },

    /// Two compute units share a logical name
    #[error("Duplicate compute unit '{name}'")]
    DuplicateUnit { name: String },

    /// The same method is bound twice on one path
    #[error("Duplicate endpoint binding {method} {path}")]
    DuplicateBinding { method: String, path: String },

    /// Sibling path parameters at the same level use different names
    #[error(
        "Conflicting path parameters under '{parent}': '{{{existing}}}' and '{{{conflicting}}}' \
        must share one name"
    )]
    ConflictingPathParameter {
        parent: String,
        existing: String,
        conflicting: String,
    },

    /// A binding, subscription or schedule points at a unit that was never declared
    #[error("{owner} references unknown compute unit '{unit}'")]
    UnknownUnit { owner: String, unit: String },

    /// A deployed function name breaks the provider's naming rules
    #[error("Invalid function name '{name}': {reason}")]
    InvalidFunctionName { name: String, reason: String },

    /// Two declarations map onto the same template logical ID
    #[error("Logical ID '{id}' is produced by more than one declaration")]
    LogicalIdCollision { id: String },

    /// Configuration rejected while composing
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

pub type Result<T> = std::result::Result<T, TopologyError>;

impl TopologyError {
    pub(crate) fn path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPathTemplate {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

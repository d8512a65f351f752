//! Error types.

use crate::format_registry::FormatId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// A specific integer was requested from an identity pool while still live.
#[error("identifier {id} is already in use")]
pub struct UniquenessError {
    /// The integer that was requested.
    pub id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced by document edits and queries.
///
/// A failing operation never mutates the document.
pub enum DocumentError {
    #[error("position {position} is out of range (document length {length})")]
    /// A position lies outside `[0, length]`.
    OutOfRange {
        /// Offending position.
        position: usize,
        /// Document length at the time of the call.
        length: usize,
    },

    #[error("invalid range {start}..{end}")]
    /// A range with `start > end`.
    InvalidRange {
        /// Range start.
        start: usize,
        /// Range end (exclusive).
        end: usize,
    },

    #[error("fragment in paragraph {paragraph} contains a paragraph separator")]
    /// Rich content whose fragment text would add an unaccounted paragraph break.
    SeparatorInFragment {
        /// Index of the offending paragraph within the content.
        paragraph: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced by the text format registry.
pub enum FormatError {
    #[error("format {0} not found")]
    /// The id is not registered.
    NotFound(FormatId),

    #[error("format index {index} out of range (len {len})")]
    /// An index outside the registry.
    IndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Number of registered formats.
        len: usize,
    },

    #[error("the default format cannot be removed")]
    /// Attempt to remove the reserved default format.
    DefaultFormat,
}

#[derive(Debug, Error)]
/// Errors produced while loading a persisted scene.
///
/// The target document is left untouched on every error.
pub enum PersistenceError {
    #[error("JSON error: {0}")]
    /// The tree could not be (de)serialized.
    Json(#[from] serde_json::Error),

    #[error("unsupported scene version '{0}'")]
    /// The tree carries a version this crate does not read.
    UnsupportedVersion(String),

    #[error("malformed scene: {0}")]
    /// The tree is well-formed JSON but violates document invariants.
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors reported by inspection providers.
pub enum InspectionError {
    #[error("inspection provider unavailable: {0}")]
    /// The provider could not be reached.
    Unavailable(String),

    #[error("inspection failed: {0}")]
    /// The provider returned an error.
    Failed(String),
}

#[derive(Debug, Error)]
/// Errors produced while loading editor configuration.
pub enum ConfigError {
    #[error("I/O error: {0}")]
    /// Filesystem I/O failed.
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    /// The configuration is not valid TOML for [`crate::EditorConfig`].
    Toml(#[from] toml::de::Error),
}

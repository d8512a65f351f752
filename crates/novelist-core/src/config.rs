//! Editor configuration.
//!
//! Loaded from TOML; every field is optional and falls back to its default.
//!
//! ```toml
//! max_undo_depth = 500
//! coalesce_typing = true
//! split_undo_on_sentence_end = true
//! indent_width = 24
//! language = "de-DE"
//! ```

use crate::error::ConfigError;
use novelist_core_lang::{LanguageRegistry, ProjectLanguage};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings shared by the scene documents of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Maximum number of undo entries kept per document.
    #[serde(default = "EditorConfig::default_max_undo_depth")]
    pub max_undo_depth: usize,
    /// Merge consecutive typing into one undo entry.
    #[serde(default = "EditorConfig::default_coalesce_typing")]
    pub coalesce_typing: bool,
    /// Close the typing undo entry once a sentence is complete.
    #[serde(default)]
    pub split_undo_on_sentence_end: bool,
    /// Extra first-line indent for paragraphs with automatic text indent.
    #[serde(default = "EditorConfig::default_indent_width")]
    pub indent_width: u32,
    /// Language tag of new documents.
    #[serde(default = "EditorConfig::default_language")]
    pub language: String,
}

impl EditorConfig {
    const fn default_max_undo_depth() -> usize {
        1000
    }

    const fn default_coalesce_typing() -> bool {
        true
    }

    const fn default_indent_width() -> u32 {
        20
    }

    fn default_language() -> String {
        "en-US".to_string()
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// The configured language, or the default language if the tag is not in `registry`.
    pub fn project_language(&self, registry: &LanguageRegistry) -> ProjectLanguage {
        registry.parse(&self.language).unwrap_or_else(|err| {
            tracing::warn!(%err, "falling back to default language");
            ProjectLanguage::default()
        })
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_undo_depth: Self::default_max_undo_depth(),
            coalesce_typing: Self::default_coalesce_typing(),
            split_undo_on_sentence_end: false,
            indent_width: Self::default_indent_width(),
            language: Self::default_language(),
        }
    }
}

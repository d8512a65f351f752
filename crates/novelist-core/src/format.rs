//! Text format definitions.
//!
//! A [`TextFormat`] bundles the paragraph attributes (alignment, margins, indentation) and the
//! character attributes of one named format. Documents refer to formats only through
//! [`crate::FormatId`]s handed out by the [`crate::TextFormatRegistry`].

use serde::{Deserialize, Serialize};

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Flush left.
    #[default]
    Left,
    /// Flush right.
    Right,
    /// Centered.
    Center,
    /// Justified.
    Justify,
}

/// Paragraph margins in device-independent units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Margins {
    /// Space above the paragraph.
    pub top: u32,
    /// Space below the paragraph.
    pub bottom: u32,
    /// Left margin.
    pub left: u32,
    /// Right margin.
    pub right: u32,
}

/// Paragraph indentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Indentation {
    /// Fixed indentation level of the whole paragraph.
    pub indent: u32,
    /// Indentation of the first line.
    pub text_indent: u32,
    /// Indent the first line automatically when the previous paragraph has the same format.
    pub auto_text_indent: bool,
}

/// Character attribute flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterFormat {
    /// Bold weight.
    pub bold: bool,
    /// Italic.
    pub italic: bool,
    /// Underline.
    pub underline: bool,
    /// Overline.
    pub overline: bool,
    /// Strikethrough.
    pub strikethrough: bool,
    /// Small-caps capitalization.
    pub small_caps: bool,
}

/// A named format definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextFormat {
    /// Display name.
    pub name: String,
    /// Paragraph alignment.
    pub alignment: Alignment,
    /// Paragraph margins.
    pub margins: Margins,
    /// Paragraph indentation.
    pub indentation: Indentation,
    /// Character attributes.
    pub character: CharacterFormat,
}

impl TextFormat {
    /// A plain format with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style alignment setter.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Builder-style margins setter.
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    /// Builder-style indentation setter.
    pub fn with_indentation(mut self, indentation: Indentation) -> Self {
        self.indentation = indentation;
        self
    }

    /// Builder-style character attribute setter.
    pub fn with_character(mut self, character: CharacterFormat) -> Self {
        self.character = character;
        self
    }

    /// Toggle bold.
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.character.bold = bold;
        self
    }

    /// Toggle italic.
    pub fn with_italic(mut self, italic: bool) -> Self {
        self.character.italic = italic;
        self
    }

    /// Returns `true` if both formats carry the same attributes, ignoring the name.
    pub fn same_attributes(&self, other: &TextFormat) -> bool {
        self.alignment == other.alignment
            && self.margins == other.margins
            && self.indentation == other.indentation
            && self.character == other.character
    }
}

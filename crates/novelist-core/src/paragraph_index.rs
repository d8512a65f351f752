//! Position ↔ paragraph index.
//!
//! Mirrors the document's flat text (paragraphs joined by `\n`) in a [`Rope`], giving
//! O(log N) conversion between absolute positions and paragraph numbers. Soft line breaks
//! (U+2028) are plain characters here; ropey is built without Unicode line handling so only
//! `\n` separates paragraphs.

use ropey::Rope;
use std::ops::Range;

/// Paragraph separator in the flat position space.
pub const PARAGRAPH_SEPARATOR: char = '\n';

/// Rope-backed paragraph index.
#[derive(Debug, Clone, Default)]
pub struct ParagraphIndex {
    rope: Rope,
}

impl ParagraphIndex {
    /// An index over a single empty paragraph.
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Build from the flat document text.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Total length in characters, separators included.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Number of paragraphs (always at least one).
    pub fn paragraph_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Absolute position of the first character of `paragraph`.
    pub fn paragraph_start(&self, paragraph: usize) -> usize {
        self.rope.line_to_char(paragraph.min(self.paragraph_count() - 1))
    }

    /// `[start, end)` of `paragraph`, excluding its trailing separator.
    pub fn paragraph_range(&self, paragraph: usize) -> Range<usize> {
        let start = self.paragraph_start(paragraph);
        let next = paragraph + 1;
        let end = if next < self.paragraph_count() {
            self.rope.line_to_char(next) - 1
        } else {
            self.rope.len_chars()
        };
        start..end
    }

    /// Paragraph containing `pos`. A position on a separator belongs to the paragraph it ends.
    pub fn paragraph_of(&self, pos: usize) -> usize {
        self.rope.char_to_line(pos.min(self.rope.len_chars()))
    }

    /// Insert flat text (which may contain separators) at `pos`.
    pub fn insert(&mut self, pos: usize, text: &str) {
        self.rope.insert(pos, text);
    }

    /// Remove the flat range `range`.
    pub fn remove(&mut self, range: Range<usize>) {
        self.rope.remove(range);
    }

    /// Flat text of `range`.
    pub fn slice(&self, range: Range<usize>) -> String {
        self.rope.slice(range).to_string()
    }

    /// Character at `pos`.
    pub fn char_at(&self, pos: usize) -> Option<char> {
        (pos < self.rope.len_chars()).then(|| self.rope.char(pos))
    }

    /// Whole flat text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_ranges() {
        let index = ParagraphIndex::from_text("Hello\n\nWorld");
        assert_eq!(index.paragraph_count(), 3);
        assert_eq!(index.paragraph_range(0), 0..5);
        assert_eq!(index.paragraph_range(1), 6..6);
        assert_eq!(index.paragraph_range(2), 7..12);
        assert_eq!(index.paragraph_of(5), 0);
        assert_eq!(index.paragraph_of(6), 1);
        assert_eq!(index.paragraph_of(12), 2);
    }

    #[test]
    fn soft_breaks_do_not_split_paragraphs() {
        let index = ParagraphIndex::from_text("one\u{2028}two\nthree");
        assert_eq!(index.paragraph_count(), 2);
        assert_eq!(index.paragraph_range(0), 0..7);
    }

    #[test]
    fn edits_update_counts() {
        let mut index = ParagraphIndex::new();
        assert_eq!(index.paragraph_count(), 1);
        index.insert(0, "ab\ncd");
        assert_eq!(index.paragraph_count(), 2);
        index.remove(1..4);
        assert_eq!(index.text(), "ad");
        assert_eq!(index.char_at(1), Some('d'));
        assert_eq!(index.char_at(2), None);
    }
}

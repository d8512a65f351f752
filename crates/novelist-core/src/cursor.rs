//! Editing cursor.
//!
//! A [`TextCursor`] borrows a [`SceneDocument`] mutably and edits it at a position, optionally
//! with a selection between `anchor` and `position`. Every mutation goes through the scene, so it
//! is recorded in the undo history and shifts insights before the call returns. Operations given a
//! position outside `[0, len]` fail with [`DocumentError`] and leave the document untouched.

use crate::document::{LINE_SEPARATOR, RichText};
use crate::error::DocumentError;
use crate::format_registry::FormatId;
use crate::history::DocumentCommand;
use crate::scene::SceneDocument;
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

/// Cursor movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveOperation {
    /// One position back.
    Left,
    /// One position forward.
    Right,
    /// Start of the document.
    Start,
    /// End of the document.
    End,
    /// Start of the current paragraph.
    StartOfParagraph,
    /// End of the current paragraph.
    EndOfParagraph,
    /// Start of the word under the cursor.
    StartOfWord,
    /// End of the word under the cursor.
    EndOfWord,
    /// Start of the next word, possibly in a later paragraph.
    StartOfNextWord,
    /// Start of the previous word, possibly in an earlier paragraph.
    StartOfPreviousWord,
    /// Start of the next paragraph.
    StartOfNextParagraph,
    /// Start of the previous paragraph.
    StartOfPreviousParagraph,
}

/// A position (and optional selection) in a scene document.
pub struct TextCursor<'d> {
    scene: &'d mut SceneDocument,
    position: usize,
    anchor: usize,
    typing_format: Option<FormatId>,
}

impl<'d> TextCursor<'d> {
    pub(crate) fn new(scene: &'d mut SceneDocument, position: usize) -> Self {
        let position = position.min(scene.len());
        Self {
            scene,
            position,
            anchor: position,
            typing_format: None,
        }
    }

    /// The scene being edited.
    pub fn scene(&self) -> &SceneDocument {
        self.scene
    }

    /// Cursor position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Selection anchor; equal to `position` without a selection.
    pub fn anchor(&self) -> usize {
        self.anchor
    }

    /// Move to `pos` (clamped into the document), dropping the selection.
    pub fn set_position(&mut self, pos: usize) {
        let pos = pos.min(self.scene.len());
        self.position = pos;
        self.anchor = pos;
        self.typing_format = None;
    }

    /// Select from `anchor` to `position`, both clamped.
    pub fn select(&mut self, anchor: usize, position: usize) {
        let len = self.scene.len();
        self.anchor = anchor.min(len);
        self.position = position.min(len);
        self.typing_format = None;
    }

    /// Drop the selection, keeping the position.
    pub fn clear_selection(&mut self) {
        self.anchor = self.position;
    }

    /// Selected range, ordered.
    pub fn selection(&self) -> Range<usize> {
        self.anchor.min(self.position)..self.anchor.max(self.position)
    }

    /// Returns `true` if something is selected.
    pub fn has_selection(&self) -> bool {
        self.anchor != self.position
    }

    /// Text of the selection, paragraphs joined with `\n`.
    pub fn selected_text(&self) -> String {
        self.scene
            .document()
            .text_in_range(self.selection())
            .unwrap_or_default()
    }

    /// Returns `true` if `pos` lies inside the selection.
    pub fn contains(&self, pos: usize) -> bool {
        self.selection().contains(&pos)
    }

    /// Returns `true` at the document start.
    pub fn at_start(&self) -> bool {
        self.position == 0
    }

    /// Returns `true` at the document end.
    pub fn at_end(&self) -> bool {
        self.position == self.scene.len()
    }

    fn current_paragraph(&self) -> Range<usize> {
        let document = self.scene.document();
        document.paragraph_range(document.paragraph_of(self.position))
    }

    /// Returns `true` at the start of a paragraph.
    pub fn at_paragraph_start(&self) -> bool {
        self.position == self.current_paragraph().start
    }

    /// Returns `true` at the end of a paragraph.
    pub fn at_paragraph_end(&self) -> bool {
        self.position == self.current_paragraph().end
    }

    /// Index of the paragraph holding the cursor.
    pub fn paragraph_index(&self) -> usize {
        self.scene.document().paragraph_of(self.position)
    }

    /// Word spans of paragraph `index` in document positions.
    fn words_in_paragraph(&self, index: usize) -> Vec<Range<usize>> {
        let document = self.scene.document();
        let Some(paragraph) = document.paragraph(index) else {
            return Vec::new();
        };
        let start = document.paragraph_range(index).start;
        let text = paragraph.text();

        let mut words = Vec::new();
        let mut chars_before = 0;
        let mut last_byte = 0;
        for (byte, segment) in text.split_word_bound_indices() {
            chars_before += text[last_byte..byte].chars().count();
            last_byte = byte;
            if segment.chars().next().is_some_and(char::is_alphanumeric) {
                let from = start + chars_before;
                words.push(from..from + segment.chars().count());
            }
        }
        words
    }

    fn target(&self, op: MoveOperation) -> usize {
        let document = self.scene.document();
        let len = document.len();
        let pos = self.position;
        let paragraph = document.paragraph_of(pos);

        match op {
            MoveOperation::Left => pos.saturating_sub(1),
            MoveOperation::Right => (pos + 1).min(len),
            MoveOperation::Start => 0,
            MoveOperation::End => len,
            MoveOperation::StartOfParagraph => document.paragraph_range(paragraph).start,
            MoveOperation::EndOfParagraph => document.paragraph_range(paragraph).end,
            MoveOperation::StartOfWord => self
                .words_in_paragraph(paragraph)
                .into_iter()
                .find(|w| w.start <= pos && pos <= w.end)
                .map_or(pos, |w| w.start),
            MoveOperation::EndOfWord => self
                .words_in_paragraph(paragraph)
                .into_iter()
                .find(|w| w.start <= pos && pos <= w.end)
                .map_or(pos, |w| w.end),
            MoveOperation::StartOfNextWord => (paragraph..document.paragraph_count())
                .flat_map(|p| self.words_in_paragraph(p))
                .find(|w| w.start > pos)
                .map_or(len, |w| w.start),
            MoveOperation::StartOfPreviousWord => (0..=paragraph)
                .rev()
                .flat_map(|p| self.words_in_paragraph(p).into_iter().rev())
                .find(|w| w.start < pos)
                .map_or(0, |w| w.start),
            MoveOperation::StartOfNextParagraph => {
                if paragraph + 1 < document.paragraph_count() {
                    document.paragraph_range(paragraph + 1).start
                } else {
                    len
                }
            }
            MoveOperation::StartOfPreviousParagraph => paragraph
                .checked_sub(1)
                .map_or(0, |prev| document.paragraph_range(prev).start),
        }
    }

    /// Move by `op`, dropping the selection. Returns `true` if the position changed.
    pub fn move_to(&mut self, op: MoveOperation) -> bool {
        let before = self.position;
        let target = self.target(op);
        self.set_position(target);
        before != target
    }

    /// Move by `op`, extending the selection. Returns `true` if the position changed.
    pub fn select_to(&mut self, op: MoveOperation) -> bool {
        let before = self.position;
        self.position = self.target(op);
        self.typing_format = None;
        before != self.position
    }

    /// Select the paragraph holding the cursor, separator excluded.
    pub fn select_paragraph(&mut self) {
        let range = self.current_paragraph();
        self.select(range.start, range.end);
    }

    fn apply_edit(&mut self, commands: Vec<DocumentCommand>) -> Result<(), DocumentError> {
        let position = match <[DocumentCommand; 1]>::try_from(commands) {
            Ok([command]) => self.scene.execute(command, true)?,
            Err(commands) => self.scene.execute_group(commands)?,
        };
        self.set_position(position);
        Ok(())
    }

    /// Commands replacing the selection with `content` (or inserting it at the cursor).
    fn replacement(&self, content: RichText) -> Vec<DocumentCommand> {
        let selection = self.selection();
        let mut commands = Vec::with_capacity(2);
        if !selection.is_empty() {
            commands.push(DocumentCommand::remove(selection.clone()));
        }
        if !content.is_empty() {
            commands.push(DocumentCommand::insert(selection.start, content));
        }
        commands
    }

    /// Insert `text` in the typing format, or the format in effect at the cursor. A selection is
    /// replaced in the same undo step.
    pub fn insert_text(&mut self, text: &str) -> Result<(), DocumentError> {
        let format = match self.typing_format {
            Some(format) => format,
            None => self.scene.character_format_at(self.selection().start)?,
        };
        self.insert_text_with_format(text, format)
    }

    /// Insert `text` in `format` (unknown ids fall back to the default format).
    pub fn insert_text_with_format(&mut self, text: &str, format: FormatId) -> Result<(), DocumentError> {
        let start = self.selection().start;
        self.scene.document().check_range(&self.selection())?;
        let paragraph_format = self.scene.paragraph_format_at(start)?;

        let commands = self.replacement(RichText::plain(text, format, paragraph_format));
        if commands.is_empty() {
            return Ok(());
        }
        self.apply_edit(commands)
    }

    /// Split the paragraph at the cursor; the new paragraph keeps the current paragraph format.
    pub fn break_paragraph(&mut self) -> Result<(), DocumentError> {
        let format = self.scene.paragraph_format_at(self.selection().start)?;
        self.break_paragraph_with_format(format)
    }

    /// Split the paragraph at the cursor, giving the new paragraph `format`.
    pub fn break_paragraph_with_format(&mut self, format: FormatId) -> Result<(), DocumentError> {
        let start = self.selection().start;
        let character = match self.typing_format {
            Some(character) => character,
            None => self.scene.character_format_at(start)?,
        };
        let commands = self.replacement(RichText::paragraph_break(format, character));
        self.apply_edit(commands)
    }

    /// Insert a soft line break (U+2028) inside the paragraph.
    pub fn break_line(&mut self) -> Result<(), DocumentError> {
        self.insert_text(&LINE_SEPARATOR.to_string())
    }

    /// Delete the selection, or the position before the cursor.
    pub fn delete_previous(&mut self) -> Result<(), DocumentError> {
        if self.has_selection() {
            return self.delete_selected();
        }
        if self.position == 0 {
            return Ok(());
        }
        self.delete_range(self.position - 1, self.position)
    }

    /// Delete the selection, or the position after the cursor.
    pub fn delete_next(&mut self) -> Result<(), DocumentError> {
        if self.has_selection() {
            return self.delete_selected();
        }
        if self.position == self.scene.len() {
            return Ok(());
        }
        self.delete_range(self.position, self.position + 1)
    }

    /// Delete the selection.
    pub fn delete_selected(&mut self) -> Result<(), DocumentError> {
        let selection = self.selection();
        self.delete_range(selection.start, selection.end)
    }

    /// Delete `[start, end)`, merging paragraphs if a separator falls inside.
    pub fn delete_range(&mut self, start: usize, end: usize) -> Result<(), DocumentError> {
        let range = start..end;
        self.scene.document().check_range(&range)?;
        if range.is_empty() {
            self.set_position(start);
            return Ok(());
        }
        self.apply_edit(vec![DocumentCommand::remove(range)])
    }

    /// Apply a character format to the selection.
    ///
    /// Without a selection, an empty paragraph re-tags its anchor (undoable); otherwise the format
    /// is kept for the next insertion.
    pub fn set_character_format(&mut self, format: FormatId) -> Result<(), DocumentError> {
        let selection = self.selection();
        if selection.is_empty() {
            let document = self.scene.document();
            document.check_position(self.position)?;
            let paragraph = document.paragraph_of(self.position);
            if document.paragraph(paragraph).is_some_and(|p| p.is_empty()) {
                let (position, anchor) = (self.position, self.anchor);
                self.scene
                    .execute(DocumentCommand::character_format(selection, format, None), true)?;
                self.position = position;
                self.anchor = anchor;
            } else {
                self.typing_format = Some(self.scene.formats().borrow().resolve(format));
            }
            return Ok(());
        }

        self.scene
            .execute(DocumentCommand::character_format(selection, format, None), true)?;
        Ok(())
    }

    /// Re-tag fragments carrying `old` inside the selection with `new`.
    pub fn replace_character_format(&mut self, old: FormatId, new: FormatId) -> Result<(), DocumentError> {
        let selection = self.selection();
        self.scene
            .execute(DocumentCommand::character_format(selection, new, Some(old)), true)?;
        Ok(())
    }

    /// Set the format of every paragraph touched by the selection.
    pub fn set_paragraph_format(&mut self, format: FormatId) -> Result<(), DocumentError> {
        let selection = self.selection();
        self.scene
            .execute(DocumentCommand::paragraph_format(selection, format), true)?;
        Ok(())
    }

    /// Character format for the next insertion.
    pub fn character_format(&self) -> Result<FormatId, DocumentError> {
        match self.typing_format {
            Some(format) => Ok(format),
            None => self.scene.character_format_at(self.position),
        }
    }

    /// Format of the paragraph holding the cursor.
    pub fn paragraph_format(&self) -> Result<FormatId, DocumentError> {
        self.scene.paragraph_format_at(self.position)
    }

    /// Distinct consecutive character formats across the selection.
    pub fn selection_character_formats(&self) -> Result<Vec<FormatId>, DocumentError> {
        let selection = self.selection();
        if selection.is_empty() {
            return Ok(vec![self.character_format()?]);
        }
        let mut formats: Vec<FormatId> = self
            .scene
            .document()
            .format_runs(selection)?
            .into_iter()
            .map(|(_, format)| format)
            .collect();
        formats.dedup();
        Ok(formats)
    }

    /// Distinct consecutive paragraph formats across the selection.
    pub fn selection_paragraph_formats(&self) -> Result<Vec<FormatId>, DocumentError> {
        let selection = self.selection();
        let document = self.scene.document();
        document.check_range(&selection)?;
        let mut formats: Vec<FormatId> = document
            .paragraphs_in_range(&selection)
            .filter_map(|p| document.paragraph(p).map(|p| p.format()))
            .collect();
        formats.dedup();
        Ok(formats)
    }

    /// Undo through the scene and move to the affected position.
    pub fn undo(&mut self) -> bool {
        match self.scene.undo() {
            Some(position) => {
                self.set_position(position);
                true
            }
            None => false,
        }
    }

    /// Redo through the scene and move to the affected position.
    pub fn redo(&mut self) -> bool {
        match self.scene.redo() {
            Some(position) => {
                self.set_position(position);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for TextCursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextCursor")
            .field("position", &self.position)
            .field("anchor", &self.anchor)
            .field("typing_format", &self.typing_format)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::format::TextFormat;
    use crate::format_registry::TextFormatRegistry;
    use novelist_core_lang::ProjectLanguage;
    use pretty_assertions::assert_eq;

    fn scene() -> SceneDocument {
        SceneDocument::with_language(
            TextFormatRegistry::shared(),
            EditorConfig::default(),
            ProjectLanguage::default(),
        )
    }

    #[test]
    fn dream_format_scenario() {
        let mut scene = scene();
        let dream = scene
            .formats()
            .borrow_mut()
            .push_back(TextFormat::named("Dream").with_italic(true));

        let mut cursor = scene.cursor();
        cursor.insert_text("Hello, World!").unwrap();
        cursor.select(7, 12);
        cursor.set_character_format(dream).unwrap();

        let document = scene.document();
        assert_eq!(document.character_format_at(8).unwrap(), dream);
        assert_eq!(document.character_format_at(13).unwrap(), FormatId::DEFAULT);
        assert_eq!(document.character_format_at(6).unwrap(), FormatId::DEFAULT);
    }

    #[test]
    fn break_paragraph_at_end() {
        let mut scene = scene();
        let mut cursor = scene.cursor();
        cursor.insert_text("Hello").unwrap();
        cursor.break_paragraph().unwrap();
        assert_eq!(cursor.position(), 6);
        assert!(cursor.at_paragraph_start());
        assert!(cursor.at_paragraph_end());
        assert_eq!(scene.document().paragraph_texts(), vec!["Hello", ""]);
    }

    #[test]
    fn typing_replaces_selection_in_one_step() {
        let mut scene = scene();
        let mut cursor = scene.cursor();
        cursor.insert_text("one two three").unwrap();
        cursor.select(4, 7);
        cursor.insert_text("2").unwrap();
        assert_eq!(cursor.position(), 5);
        assert_eq!(cursor.scene().text(), "one 2 three");
        assert!(cursor.undo());
        assert_eq!(cursor.scene().text(), "one two three");
    }

    #[test]
    fn word_movement() {
        let mut scene = scene();
        let mut cursor = scene.cursor();
        cursor.insert_text("The quick fox.\nJumps over").unwrap();
        cursor.set_position(6);
        assert!(cursor.move_to(MoveOperation::StartOfWord));
        assert_eq!(cursor.position(), 4);
        cursor.move_to(MoveOperation::EndOfWord);
        assert_eq!(cursor.position(), 9);
        cursor.move_to(MoveOperation::StartOfNextWord);
        assert_eq!(cursor.position(), 10);
        cursor.move_to(MoveOperation::StartOfNextWord);
        assert_eq!(cursor.position(), 15);
        cursor.move_to(MoveOperation::StartOfPreviousWord);
        assert_eq!(cursor.position(), 10);
        cursor.move_to(MoveOperation::StartOfNextParagraph);
        assert_eq!(cursor.position(), 15);
        cursor.move_to(MoveOperation::StartOfPreviousParagraph);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn select_to_extends_selection() {
        let mut scene = scene();
        let mut cursor = scene.cursor();
        cursor.insert_text("alpha beta").unwrap();
        cursor.set_position(0);
        cursor.select_to(MoveOperation::EndOfWord);
        assert_eq!(cursor.selection(), 0..5);
        assert_eq!(cursor.selected_text(), "alpha");
        cursor.select_paragraph();
        assert_eq!(cursor.selection(), 0..10);
    }

    #[test]
    fn typing_format_applies_to_next_insert() {
        let mut scene = scene();
        let bold = scene
            .formats()
            .borrow_mut()
            .push_back(TextFormat::named("Bold").with_bold(true));
        let mut cursor = scene.cursor();
        cursor.insert_text("plain ").unwrap();
        cursor.set_character_format(bold).unwrap();
        assert_eq!(cursor.character_format().unwrap(), bold);
        cursor.insert_text("strong").unwrap();
        assert_eq!(cursor.scene().document().character_format_at(8).unwrap(), bold);
        assert_eq!(cursor.scene().document().character_format_at(3).unwrap(), FormatId::DEFAULT);
    }

    #[test]
    fn empty_paragraph_anchor_is_retagged() {
        let mut scene = scene();
        let bold = scene
            .formats()
            .borrow_mut()
            .push_back(TextFormat::named("Bold").with_bold(true));
        let mut cursor = scene.cursor();
        cursor.set_character_format(bold).unwrap();
        assert_eq!(cursor.character_format().unwrap(), bold);
        cursor.insert_text("x").unwrap();
        assert_eq!(cursor.scene().document().character_format_at(1).unwrap(), bold);
    }

    #[test]
    fn out_of_range_delete_fails_without_mutation() {
        let mut scene = scene();
        let mut cursor = scene.cursor();
        cursor.insert_text("abc").unwrap();
        let err = cursor.delete_range(1, 9).unwrap_err();
        assert_eq!(err, DocumentError::OutOfRange { position: 9, length: 3 });
        assert_eq!(cursor.scene().text(), "abc");
    }

    #[test]
    fn selection_formats() {
        let mut scene = scene();
        let (heading, bold) = {
            let mut formats = scene.formats().borrow_mut();
            (
                formats.push_back(TextFormat::named("Heading")),
                formats.push_back(TextFormat::named("Bold").with_bold(true)),
            )
        };
        let mut cursor = scene.cursor();
        cursor.insert_text("Title\nBody text").unwrap();
        cursor.select(0, 3);
        cursor.set_paragraph_format(heading).unwrap();
        cursor.select(8, 12);
        cursor.set_character_format(bold).unwrap();

        cursor.select(0, 15);
        assert_eq!(
            cursor.selection_character_formats().unwrap(),
            vec![FormatId::DEFAULT, bold, FormatId::DEFAULT]
        );
        assert_eq!(
            cursor.selection_paragraph_formats().unwrap(),
            vec![heading, FormatId::DEFAULT]
        );

        cursor.replace_character_format(bold, FormatId::DEFAULT).unwrap();
        assert_eq!(cursor.selection_character_formats().unwrap(), vec![FormatId::DEFAULT]);
    }

    #[test]
    fn delete_previous_merges_paragraphs() {
        let mut scene = scene();
        let mut cursor = scene.cursor();
        cursor.insert_text("ab\ncd").unwrap();
        cursor.set_position(3);
        cursor.delete_previous().unwrap();
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.scene().document().paragraph_texts(), vec!["abcd"]);
        cursor.set_position(0);
        cursor.delete_previous().unwrap();
        cursor.move_to(MoveOperation::End);
        cursor.delete_next().unwrap();
        assert_eq!(cursor.scene().text(), "abcd");
    }
}

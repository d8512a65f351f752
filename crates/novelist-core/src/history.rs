//! Undo/redo history.
//!
//! Every document mutation is a [`DocumentCommand`] that knows how to apply and revert itself.
//! [`UndoHistory`] keeps a linear list of entries (each a group of commands) and a cursor
//! splitting applied entries from undone ones. Consecutive typing inserts coalesce into the open
//! entry until something closes it.

use crate::document::{Document, FragmentSnapshot, ParagraphFormatSnapshot, RichText};
use crate::error::DocumentError;
use crate::format_registry::FormatId;
use novelist_core_lang::ProjectLanguage;
use std::ops::Range;

/// Position change caused by one applied command.
///
/// A positive `delta` inserted `delta` positions at `start`; a negative one removed
/// `[start, start - delta)`. Format changes report a zero delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentEdit {
    /// Edit position.
    pub start: usize,
    /// Signed length change.
    pub delta: isize,
}

/// A reversible document mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentCommand {
    /// Insert `content` at `position`.
    Insert {
        /// Insertion point.
        position: usize,
        /// Inserted slice.
        content: RichText,
    },
    /// Remove `range`.
    Remove {
        /// Removed range.
        range: Range<usize>,
        /// Removed slice, filled in when the command is applied.
        removed: RichText,
    },
    /// Re-tag character formats over `range`.
    CharacterFormat {
        /// Affected range.
        range: Range<usize>,
        /// New format.
        format: FormatId,
        /// Only re-tag fragments currently carrying this format.
        only: Option<FormatId>,
        /// Fragments before the change, filled in when applied.
        previous: FragmentSnapshot,
    },
    /// Set the paragraph format of every paragraph touched by `range`.
    ParagraphFormat {
        /// Affected range.
        range: Range<usize>,
        /// New format.
        format: FormatId,
        /// Formats before the change, filled in when applied.
        previous: ParagraphFormatSnapshot,
    },
}

impl DocumentCommand {
    /// An insertion.
    pub fn insert(position: usize, content: RichText) -> Self {
        Self::Insert { position, content }
    }

    /// A removal of `range`.
    pub fn remove(range: Range<usize>) -> Self {
        Self::Remove {
            range,
            removed: RichText::empty(),
        }
    }

    /// A character-format change.
    pub fn character_format(range: Range<usize>, format: FormatId, only: Option<FormatId>) -> Self {
        Self::CharacterFormat {
            range,
            format,
            only,
            previous: Vec::new(),
        }
    }

    /// A paragraph-format change.
    pub fn paragraph_format(range: Range<usize>, format: FormatId) -> Self {
        Self::ParagraphFormat {
            range,
            format,
            previous: Vec::new(),
        }
    }

    /// Apply to `doc`, capturing whatever the command needs to revert itself.
    pub fn apply(&mut self, doc: &mut Document) -> Result<DocumentEdit, DocumentError> {
        match self {
            Self::Insert { position, content } => {
                let len = doc.insert_rich(*position, content)?;
                Ok(DocumentEdit {
                    start: *position,
                    delta: len as isize,
                })
            }
            Self::Remove { range, removed } => {
                *removed = doc.remove(range.clone())?;
                Ok(DocumentEdit {
                    start: range.start,
                    delta: -(range.len() as isize),
                })
            }
            Self::CharacterFormat {
                range,
                format,
                only,
                previous,
            } => {
                *previous = doc.set_character_format(range.clone(), *format, *only)?;
                Ok(DocumentEdit {
                    start: range.start,
                    delta: 0,
                })
            }
            Self::ParagraphFormat {
                range,
                format,
                previous,
            } => {
                *previous = doc.set_paragraph_format(range.clone(), *format)?;
                Ok(DocumentEdit {
                    start: range.start,
                    delta: 0,
                })
            }
        }
    }

    /// Undo a previously applied command.
    pub fn revert(&self, doc: &mut Document) -> Result<DocumentEdit, DocumentError> {
        match self {
            Self::Insert { position, content } => {
                let range = *position..*position + content.len();
                doc.remove(range.clone())?;
                Ok(DocumentEdit {
                    start: range.start,
                    delta: -(range.len() as isize),
                })
            }
            Self::Remove { range, removed } => {
                let len = doc.insert_rich(range.start, removed)?;
                Ok(DocumentEdit {
                    start: range.start,
                    delta: len as isize,
                })
            }
            Self::CharacterFormat {
                range, previous, ..
            } => {
                doc.restore_fragments(previous);
                Ok(DocumentEdit {
                    start: range.start,
                    delta: 0,
                })
            }
            Self::ParagraphFormat {
                range, previous, ..
            } => {
                doc.restore_paragraph_formats(previous);
                Ok(DocumentEdit {
                    start: range.start,
                    delta: 0,
                })
            }
        }
    }

    /// Cursor position after applying.
    pub fn position_after_apply(&self) -> usize {
        match self {
            Self::Insert { position, content } => position + content.len(),
            Self::Remove { range, .. } => range.start,
            Self::CharacterFormat { range, .. } | Self::ParagraphFormat { range, .. } => range.end,
        }
    }

    /// Cursor position after reverting.
    pub fn position_after_revert(&self) -> usize {
        match self {
            Self::Insert { position, .. } => *position,
            Self::Remove { range, .. } => range.end,
            Self::CharacterFormat { range, .. } | Self::ParagraphFormat { range, .. } => range.end,
        }
    }

    /// Inline typing that may join an open entry.
    fn is_typing(&self) -> bool {
        matches!(self, Self::Insert { content, .. } if content.is_single_paragraph() && !content.is_empty())
    }
}

/// One undo step: commands applied in order, reverted in reverse order.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    commands: Vec<DocumentCommand>,
}

impl HistoryEntry {
    /// Commands of this entry in application order.
    pub fn commands(&self) -> &[DocumentCommand] {
        &self.commands
    }

    /// Absorb a typing insert directly following this entry's own typing run.
    fn try_coalesce(&mut self, command: &DocumentCommand) -> bool {
        let [DocumentCommand::Insert { position, content }] = self.commands.as_mut_slice() else {
            return false;
        };
        let DocumentCommand::Insert {
            position: next,
            content: more,
        } = command
        else {
            return false;
        };
        if !content.is_single_paragraph() || *position + content.len() != *next {
            return false;
        }
        content.extend_inline(more.clone());
        true
    }

    fn typed_text(&self) -> Option<String> {
        match self.commands.as_slice() {
            [DocumentCommand::Insert { content, .. }] => Some(content.text()),
            _ => None,
        }
    }
}

/// Result of an undo or redo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    /// Edits in the order they were performed on the document.
    pub edits: Vec<DocumentEdit>,
    /// Suggested cursor position afterwards.
    pub cursor: usize,
}

/// Linear undo/redo history.
#[derive(Debug, Clone)]
pub struct UndoHistory {
    entries: Vec<HistoryEntry>,
    /// Entries `[0, cursor)` are applied.
    cursor: usize,
    max_depth: usize,
    coalesce_typing: bool,
    /// Language used to close a typing run at a sentence end, if enabled.
    sentence_language: Option<ProjectLanguage>,
    /// Whether `entries[cursor - 1]` still accepts typing.
    open: bool,
    /// Clean point; `None` once it became unreachable.
    clean_index: Option<usize>,
}

impl UndoHistory {
    /// Create an empty history keeping at most `max_depth` entries.
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            max_depth: max_depth.max(1),
            coalesce_typing: true,
            sentence_language: None,
            open: false,
            clean_index: Some(0),
        }
    }

    /// Enable or disable typing coalescing.
    pub fn set_coalesce_typing(&mut self, enabled: bool) {
        self.coalesce_typing = enabled;
        if !enabled {
            self.open = false;
        }
    }

    /// Close the typing run whenever it completes a sentence in `language`.
    pub fn set_sentence_split(&mut self, language: Option<ProjectLanguage>) {
        self.sentence_language = language;
    }

    /// Returns `true` if there is an entry to undo.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Returns `true` if there is an entry to redo.
    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Number of undoable entries.
    pub fn undo_depth(&self) -> usize {
        self.cursor
    }

    /// Number of redoable entries.
    pub fn redo_depth(&self) -> usize {
        self.entries.len() - self.cursor
    }

    /// Entries in order; `[0, undo_depth)` are applied.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Returns `true` if the history sits at its clean point.
    pub fn is_clean(&self) -> bool {
        self.clean_index == Some(self.cursor)
    }

    /// Mark the current state as clean (e.g. after saving).
    pub fn mark_clean(&mut self) {
        self.clean_index = Some(self.cursor);
        self.end_group();
    }

    /// Close the open typing run; the next insert starts a new entry.
    pub fn end_group(&mut self) {
        self.open = false;
    }

    /// Drop everything and mark the empty history clean.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
        self.open = false;
        self.clean_index = Some(0);
    }

    fn prune_redo(&mut self) {
        if self.cursor == self.entries.len() {
            return;
        }
        if let Some(clean_index) = self.clean_index
            && clean_index > self.cursor
        {
            self.clean_index = None;
        }
        self.entries.truncate(self.cursor);
    }

    fn trim(&mut self) {
        while self.entries.len() > self.max_depth {
            self.entries.remove(0);
            self.cursor -= 1;
            self.clean_index = match self.clean_index {
                Some(0) | None => None,
                Some(idx) => Some(idx - 1),
            };
            tracing::debug!(max_depth = self.max_depth, "dropped oldest undo entry");
        }
    }

    /// Record an applied command, coalescing typing into the open entry.
    pub fn push(&mut self, command: DocumentCommand) {
        self.prune_redo();
        let typing = self.coalesce_typing && command.is_typing();

        let coalesced = typing
            && self.open
            && self.clean_index != Some(self.cursor)
            && self
                .entries
                .last_mut()
                .is_some_and(|entry| entry.try_coalesce(&command));

        if !coalesced {
            self.entries.push(HistoryEntry {
                commands: vec![command],
            });
            self.cursor = self.entries.len();
            self.trim();
        }
        self.open = typing;

        if self.open
            && let Some(language) = &self.sentence_language
            && let Some(text) = self.entries.last().and_then(HistoryEntry::typed_text)
            && language.is_complete_sentence(&text)
        {
            self.open = false;
        }
    }

    /// Record several applied commands as one entry.
    pub fn push_group(&mut self, commands: Vec<DocumentCommand>) {
        if commands.is_empty() {
            return;
        }
        self.prune_redo();
        self.entries.push(HistoryEntry { commands });
        self.cursor = self.entries.len();
        self.open = false;
        self.trim();
    }

    /// Revert the latest applied entry. `Ok(None)` if there is nothing to undo.
    pub fn undo(&mut self, doc: &mut Document) -> Result<Option<Replay>, DocumentError> {
        if self.cursor == 0 {
            return Ok(None);
        }
        let entry = &self.entries[self.cursor - 1];
        let mut edits = Vec::with_capacity(entry.commands.len());
        let mut cursor = 0;
        for command in entry.commands.iter().rev() {
            edits.push(command.revert(doc)?);
            cursor = command.position_after_revert();
        }

        self.cursor -= 1;
        self.open = false;
        tracing::debug!(undo_depth = self.cursor, "undo");
        Ok(Some(Replay { edits, cursor }))
    }

    /// Re-apply the next undone entry. `Ok(None)` if there is nothing to redo.
    pub fn redo(&mut self, doc: &mut Document) -> Result<Option<Replay>, DocumentError> {
        if self.cursor == self.entries.len() {
            return Ok(None);
        }
        let entry = &mut self.entries[self.cursor];
        let mut edits = Vec::with_capacity(entry.commands.len());
        let mut cursor = 0;
        for command in entry.commands.iter_mut() {
            edits.push(command.apply(doc)?);
            cursor = command.position_after_apply();
        }

        self.cursor += 1;
        self.open = false;
        tracing::debug!(undo_depth = self.cursor, "redo");
        Ok(Some(Replay { edits, cursor }))
    }
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn typed(doc: &mut Document, history: &mut UndoHistory, pos: usize, text: &str) {
        let mut cmd = DocumentCommand::insert(
            pos,
            RichText::plain(text, FormatId::DEFAULT, FormatId::DEFAULT),
        );
        cmd.apply(doc).unwrap();
        history.push(cmd);
    }

    #[test]
    fn typing_coalesces_into_one_entry() {
        let mut doc = Document::default();
        let mut history = UndoHistory::default();
        for (i, c) in "Hello".chars().enumerate() {
            typed(&mut doc, &mut history, i, &c.to_string());
        }
        assert_eq!(history.undo_depth(), 1);

        let replay = history.undo(&mut doc).unwrap().unwrap();
        assert_eq!(doc.text(), "");
        assert_eq!(replay.cursor, 0);
        assert_eq!(replay.edits, vec![DocumentEdit { start: 0, delta: -5 }]);
        assert!(history.undo(&mut doc).unwrap().is_none());
    }

    #[test]
    fn non_contiguous_typing_starts_new_entry() {
        let mut doc = Document::default();
        let mut history = UndoHistory::default();
        typed(&mut doc, &mut history, 0, "ab");
        typed(&mut doc, &mut history, 0, "x");
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn end_group_splits_runs() {
        let mut doc = Document::default();
        let mut history = UndoHistory::default();
        typed(&mut doc, &mut history, 0, "ab");
        history.end_group();
        typed(&mut doc, &mut history, 2, "cd");
        assert_eq!(history.undo_depth(), 2);
        history.undo(&mut doc).unwrap();
        assert_eq!(doc.text(), "ab");
    }

    #[test]
    fn structural_edits_close_the_run() {
        let mut doc = Document::default();
        let mut history = UndoHistory::default();
        typed(&mut doc, &mut history, 0, "ab");
        let mut brk = DocumentCommand::insert(
            2,
            RichText::paragraph_break(FormatId::DEFAULT, FormatId::DEFAULT),
        );
        brk.apply(&mut doc).unwrap();
        history.push(brk);
        typed(&mut doc, &mut history, 3, "c");
        assert_eq!(history.undo_depth(), 3);
    }

    #[test]
    fn push_prunes_redo_branch() {
        let mut doc = Document::default();
        let mut history = UndoHistory::default();
        typed(&mut doc, &mut history, 0, "ab");
        history.undo(&mut doc).unwrap();
        assert!(history.can_redo());
        typed(&mut doc, &mut history, 0, "z");
        assert!(!history.can_redo());
        assert_eq!(doc.text(), "z");
    }

    #[test]
    fn remove_and_format_round_trip() {
        let mut doc = Document::default();
        let mut history = UndoHistory::default();
        typed(&mut doc, &mut history, 0, "Hello world");

        let mut fmt = DocumentCommand::character_format(0..5, FormatId(2), None);
        fmt.apply(&mut doc).unwrap();
        history.push(fmt);
        let mut rm = DocumentCommand::remove(5..11);
        rm.apply(&mut doc).unwrap();
        history.push(rm);
        let after = doc.clone();
        assert_eq!(doc.text(), "Hello");

        while history.can_undo() {
            history.undo(&mut doc).unwrap();
        }
        assert_eq!(doc.text(), "");
        while history.can_redo() {
            history.redo(&mut doc).unwrap();
        }
        assert_eq!(doc, after);
    }

    #[test]
    fn clean_point_tracking() {
        let mut doc = Document::default();
        let mut history = UndoHistory::default();
        assert!(history.is_clean());
        typed(&mut doc, &mut history, 0, "a");
        assert!(!history.is_clean());
        history.mark_clean();
        typed(&mut doc, &mut history, 1, "b");
        // typing after a save never merges into the saved entry
        assert_eq!(history.undo_depth(), 2);
        history.undo(&mut doc).unwrap();
        assert!(history.is_clean());
        history.undo(&mut doc).unwrap();
        typed(&mut doc, &mut history, 0, "x");
        assert!(!history.is_clean());
        while history.can_undo() {
            history.undo(&mut doc).unwrap();
        }
        assert!(!history.is_clean());
    }

    #[test]
    fn max_depth_drops_oldest() {
        let mut doc = Document::default();
        let mut history = UndoHistory::new(2);
        for i in 0..4 {
            typed(&mut doc, &mut history, i, "a");
            history.end_group();
        }
        assert_eq!(history.undo_depth(), 2);
        history.undo(&mut doc).unwrap();
        history.undo(&mut doc).unwrap();
        assert_eq!(doc.text(), "aa");
    }

    #[test]
    fn sentence_end_closes_run() {
        let mut doc = Document::default();
        let mut history = UndoHistory::default();
        history.set_sentence_split(Some(ProjectLanguage::default()));
        for (i, c) in "Hi. Yo".chars().enumerate() {
            typed(&mut doc, &mut history, i, &c.to_string());
        }
        assert_eq!(history.undo_depth(), 2);
        history.undo(&mut doc).unwrap();
        assert_eq!(doc.text(), "Hi.");
    }
}

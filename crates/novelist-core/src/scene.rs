//! Scene documents.
//!
//! A [`SceneDocument`] ties one [`Document`] to its undo history, its insights and the project's
//! shared format registry. Every mutation runs through [`SceneDocument::execute`], which applies
//! a [`DocumentCommand`], shifts insights synchronously, bumps the revision and records history.
//! Undo and redo go down the same path, so insights see them as ordinary edits.

use crate::analysis::{AnalysisOutput, AnalysisRequest, AnalysisResult, TextStatistics};
use crate::config::EditorConfig;
use crate::cursor::TextCursor;
use crate::document::{Document, RichText};
use crate::error::DocumentError;
use crate::format_registry::{FormatId, SharedFormatRegistry};
use crate::history::{DocumentCommand, DocumentEdit, Replay, UndoHistory};
use crate::insight::{Insight, InsightCommand, InsightHandle, InsightManager};
use crate::inspection::insight_from_finding;
use crate::marker::{MarkerAttachment, MarkerId, MarkerSet, TextMarker};
use novelist_core_lang::{LanguageRegistry, ProjectLanguage};
use std::ops::Range;

/// A scene's formatted text together with history and insights.
pub struct SceneDocument {
    title: String,
    document: Document,
    history: UndoHistory,
    insights: InsightManager,
    markers: MarkerSet,
    formats: SharedFormatRegistry,
    language: ProjectLanguage,
    config: EditorConfig,
    revision: u64,
    statistics: Option<TextStatistics>,
}

impl SceneDocument {
    /// Create an empty scene using the configured language.
    pub fn new(
        formats: SharedFormatRegistry,
        config: EditorConfig,
        languages: &LanguageRegistry,
    ) -> Self {
        let language = config.project_language(languages);
        Self::with_language(formats, config, language)
    }

    /// Create an empty scene in an explicit language.
    pub fn with_language(
        formats: SharedFormatRegistry,
        config: EditorConfig,
        language: ProjectLanguage,
    ) -> Self {
        let default_format = formats.borrow().default_id();
        let mut history = UndoHistory::new(config.max_undo_depth);
        history.set_coalesce_typing(config.coalesce_typing);
        if config.split_undo_on_sentence_end {
            history.set_sentence_split(Some(language));
        }

        Self {
            title: String::new(),
            document: Document::new(default_format, default_format),
            history,
            insights: InsightManager::new(),
            markers: MarkerSet::new(),
            formats,
            language,
            config,
            revision: 0,
            statistics: None,
        }
    }

    /// Scene title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Rename the scene.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// The underlying document (read-only; edit through a cursor).
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Flat text.
    pub fn text(&self) -> String {
        self.document.text()
    }

    /// Length in positions.
    pub fn len(&self) -> usize {
        self.document.len()
    }

    /// Returns `true` if the scene holds no text.
    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    /// The undo history.
    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    /// Insights anchored in this scene.
    pub fn insights(&self) -> &InsightManager {
        &self.insights
    }

    /// Mutable access to insights (subscribing, editing notes).
    pub fn insights_mut(&mut self) -> &mut InsightManager {
        &mut self.insights
    }

    /// Position markers in this scene.
    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    /// Mutable access to markers (subscribing, removing, changing attachment).
    pub fn markers_mut(&mut self) -> &mut MarkerSet {
        &mut self.markers
    }

    /// Place a marker at `pos`.
    pub fn add_marker(
        &mut self,
        pos: usize,
        attachment: MarkerAttachment,
    ) -> Result<MarkerId, DocumentError> {
        self.document.check_position(pos)?;
        Ok(self.markers.insert(TextMarker::new(pos, attachment)))
    }

    /// Paragraph index and offset within that paragraph of a marker.
    pub fn marker_location(&self, id: MarkerId) -> Option<(usize, usize)> {
        let pos = self.markers.get(id)?.position();
        let paragraph = self.document.paragraph_of(pos);
        Some((paragraph, pos - self.document.paragraph_range(paragraph).start))
    }

    /// The shared format registry.
    pub fn formats(&self) -> &SharedFormatRegistry {
        &self.formats
    }

    /// Document language.
    pub fn language(&self) -> ProjectLanguage {
        self.language
    }

    /// Change the document language.
    pub fn set_language(&mut self, language: ProjectLanguage) {
        self.language = language;
        if self.config.split_undo_on_sentence_end {
            self.history.set_sentence_split(Some(language));
        }
    }

    /// Editor configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Incremented on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Latest statistics applied from the analysis worker.
    pub fn statistics(&self) -> Option<TextStatistics> {
        self.statistics
    }

    /// Returns `true` if the scene differs from its last saved state.
    pub fn is_modified(&self) -> bool {
        !self.history.is_clean()
    }

    /// Record the current state as saved.
    pub fn mark_saved(&mut self) {
        self.history.mark_clean();
    }

    /// A cursor at the start of the scene.
    pub fn cursor(&mut self) -> TextCursor<'_> {
        TextCursor::new(self, 0)
    }

    /// A cursor at `pos`.
    pub fn cursor_at(&mut self, pos: usize) -> Result<TextCursor<'_>, DocumentError> {
        self.document.check_position(pos)?;
        Ok(TextCursor::new(self, pos))
    }

    /// Map unknown format ids in `command` to the registry default.
    fn resolve_formats(&self, command: &mut DocumentCommand) {
        let formats = self.formats.borrow();
        match command {
            DocumentCommand::Insert { content, .. } => content.map_formats(|id| formats.resolve(id)),
            DocumentCommand::CharacterFormat { format, .. }
            | DocumentCommand::ParagraphFormat { format, .. } => *format = formats.resolve(*format),
            DocumentCommand::Remove { .. } => {}
        }
    }

    fn after_edit(&mut self, edit: DocumentEdit) {
        self.insights.on_document_edited(edit.start, edit.delta);
        self.markers.on_document_edited(edit.start, edit.delta);
        self.revision += 1;
    }

    /// Apply `command`, notify insights and record it in the history unless `record` is false.
    ///
    /// Returns the cursor position after the edit.
    pub fn execute(&mut self, mut command: DocumentCommand, record: bool) -> Result<usize, DocumentError> {
        self.resolve_formats(&mut command);
        let edit = command.apply(&mut self.document)?;
        self.after_edit(edit);
        self.insights.refresh_paragraphs(&self.document);

        let position = command.position_after_apply();
        if record {
            self.history.push(command);
        }
        Ok(position)
    }

    /// Apply several commands as one undo entry. On failure, already applied commands are
    /// reverted and nothing is recorded.
    pub fn execute_group(&mut self, commands: Vec<DocumentCommand>) -> Result<usize, DocumentError> {
        let mut applied: Vec<DocumentCommand> = Vec::with_capacity(commands.len());
        let mut position = 0;

        for mut command in commands {
            self.resolve_formats(&mut command);
            match command.apply(&mut self.document) {
                Ok(edit) => {
                    self.after_edit(edit);
                    position = command.position_after_apply();
                    applied.push(command);
                }
                Err(err) => {
                    for done in applied.iter().rev() {
                        if let Ok(edit) = done.revert(&mut self.document) {
                            self.after_edit(edit);
                        }
                    }
                    self.insights.refresh_paragraphs(&self.document);
                    return Err(err);
                }
            }
        }

        self.insights.refresh_paragraphs(&self.document);
        self.history.push_group(applied);
        Ok(position)
    }

    fn replay(&mut self, replay: Result<Option<Replay>, DocumentError>) -> Option<usize> {
        match replay {
            Ok(Some(replay)) => {
                for edit in replay.edits {
                    self.after_edit(edit);
                }
                self.insights.refresh_paragraphs(&self.document);
                Some(replay.cursor)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(%err, "history replay failed");
                None
            }
        }
    }

    /// Undo the latest entry. Returns the suggested cursor position, `None` if nothing to undo.
    pub fn undo(&mut self) -> Option<usize> {
        let replay = self.history.undo(&mut self.document);
        self.replay(replay)
    }

    /// Redo the next entry. Returns the suggested cursor position, `None` if nothing to redo.
    pub fn redo(&mut self) -> Option<usize> {
        let replay = self.history.redo(&mut self.document);
        self.replay(replay)
    }

    /// Returns `true` if there is something to undo.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Returns `true` if there is something to redo.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Close the current typing run.
    pub fn end_undo_group(&mut self) {
        self.history.end_group();
    }

    /// Insert plain text at `pos` in the format in effect there.
    pub fn insert_text_at(&mut self, pos: usize, text: &str) -> Result<usize, DocumentError> {
        let character = self.document.character_format_at(pos)?;
        let paragraph = self.document.paragraph_format_at(pos)?;
        let content = RichText::plain(text, character, paragraph);
        self.execute(DocumentCommand::insert(pos, content), true)
    }

    /// Delete `range`.
    pub fn delete_range(&mut self, range: Range<usize>) -> Result<usize, DocumentError> {
        self.document.check_range(&range)?;
        if range.is_empty() {
            return Ok(range.start);
        }
        self.execute(DocumentCommand::remove(range), true)
    }

    /// Re-tag the character format of `range`.
    pub fn set_character_format(&mut self, range: Range<usize>, format: FormatId) -> Result<(), DocumentError> {
        self.execute(DocumentCommand::character_format(range, format, None), true)?;
        Ok(())
    }

    /// Set the paragraph format of every paragraph touched by `range`.
    pub fn set_paragraph_format(&mut self, range: Range<usize>, format: FormatId) -> Result<(), DocumentError> {
        self.execute(DocumentCommand::paragraph_format(range, format), true)?;
        Ok(())
    }

    /// Character format at `pos`, unknown ids resolved to the default.
    pub fn character_format_at(&self, pos: usize) -> Result<FormatId, DocumentError> {
        let id = self.document.character_format_at(pos)?;
        Ok(self.formats.borrow().resolve(id))
    }

    /// Paragraph format at `pos`, unknown ids resolved to the default.
    pub fn paragraph_format_at(&self, pos: usize) -> Result<FormatId, DocumentError> {
        let id = self.document.paragraph_format_at(pos)?;
        Ok(self.formats.borrow().resolve(id))
    }

    /// First-line indent of `paragraph`, honouring automatic text indent.
    pub fn effective_text_indent(&self, paragraph: usize) -> Option<u32> {
        let current = self.document.paragraph(paragraph)?;
        let formats = self.formats.borrow();
        let indentation = formats.resolve_format(current.format()).indentation;

        if !indentation.auto_text_indent {
            return Some(indentation.text_indent);
        }
        let follows_same_format = paragraph
            .checked_sub(1)
            .and_then(|prev| self.document.paragraph(prev))
            .is_some_and(|prev| prev.format() == current.format());
        Some(if follows_same_format {
            indentation.indent + self.config.indent_width
        } else {
            indentation.indent
        })
    }

    /// Anchor a new insight.
    pub fn add_insight(&mut self, insight: Insight) -> InsightHandle {
        let handle = self.insights.insert(insight);
        self.insights.refresh_paragraphs(&self.document);
        handle
    }

    /// Run a menu action of an insight. Returns `Ok(false)` if nothing happened (stale handle or
    /// an action the host handles, like editing a note).
    pub fn trigger_insight_action(
        &mut self,
        handle: InsightHandle,
        command: &InsightCommand,
    ) -> Result<bool, DocumentError> {
        let Some(range) = self.insights.get(handle).map(Insight::range) else {
            return Ok(false);
        };

        match command {
            InsightCommand::ReplaceWith(replacement) => {
                let character = self.document.character_format_at((range.start + 1).min(range.end))?;
                let paragraph = self.document.paragraph_format_at(range.start)?;
                let content = RichText::plain(replacement, character, paragraph);
                self.insights.request_removal(handle);
                self.execute_group(vec![
                    DocumentCommand::remove(range.clone()),
                    DocumentCommand::insert(range.start, content),
                ])?;
            }
            InsightCommand::Ignore | InsightCommand::Remove => {
                self.insights.request_removal(handle);
            }
            InsightCommand::EditNote => return Ok(false),
        }

        self.insights.drain_removals();
        Ok(true)
    }

    /// Snapshot request for text statistics.
    pub fn statistics_request(&self) -> AnalysisRequest {
        AnalysisRequest::Statistics {
            revision: self.revision,
            text: self.document.text(),
        }
    }

    /// Snapshot request to inspect the paragraphs touched by `range`.
    pub fn inspection_request(&self, range: Range<usize>) -> Result<AnalysisRequest, DocumentError> {
        self.document.check_range(&range)?;
        let paragraphs = self.document.paragraphs_in_range(&range);
        let start = self.document.paragraph_range(*paragraphs.start()).start;
        let end = self.document.paragraph_range(*paragraphs.end()).end;
        Ok(AnalysisRequest::Inspect {
            revision: self.revision,
            range: start..end,
            text: self.document.text_in_range(start..end)?,
            language: self.language,
        })
    }

    /// Snapshot request to inspect the whole scene.
    pub fn full_inspection_request(&self) -> AnalysisRequest {
        AnalysisRequest::Inspect {
            revision: self.revision,
            range: 0..self.document.len(),
            text: self.document.text(),
            language: self.language,
        }
    }

    /// Apply a finished analysis. Results computed from another revision are discarded.
    ///
    /// Inspection results replace the non-persistent insights of the inspected range.
    pub fn apply_analysis(&mut self, result: AnalysisResult) -> bool {
        if result.revision != self.revision {
            tracing::debug!(
                result_revision = result.revision,
                revision = self.revision,
                "discarding analysis of an outdated revision"
            );
            return false;
        }

        match result.output {
            AnalysisOutput::Statistics(statistics) => {
                self.statistics = Some(statistics);
            }
            AnalysisOutput::Findings { range, findings } => {
                self.insights.clear_non_persistent(range.clone());
                for finding in &findings {
                    if finding.start > finding.end {
                        tracing::warn!(
                            start = finding.start,
                            end = finding.end,
                            category = %finding.category,
                            "dropping finding with inverted range"
                        );
                        continue;
                    }
                    let insight = insight_from_finding(finding, range.start);
                    if insight.range().end <= self.document.len() {
                        self.insights.insert(insight);
                    }
                }
                self.insights.refresh_paragraphs(&self.document);
            }
        }
        true
    }

    /// Swap in a freshly loaded document. Not undoable: history and insights are cleared and the
    /// result is the new clean state.
    pub(crate) fn replace_document(&mut self, document: Document) {
        self.insights.clear();
        self.markers.clear();
        self.document = document;
        self.history.clear();
        self.history.mark_clean();
        self.revision += 1;
        self.statistics = None;
    }
}

impl std::fmt::Debug for SceneDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneDocument")
            .field("title", &self.title)
            .field("language", &self.language)
            .field("revision", &self.revision)
            .field("len", &self.document.len())
            .finish()
    }
}

//! Insights: range-anchored annotations (spelling, grammar, typography, notes).
//!
//! The [`InsightManager`] owns all insights of one document in a [`RangeVec`] sorted by range,
//! hands out generation-checked [`InsightHandle`]s, keeps ranges in step with document edits and
//! auto-removes insights whose range collapsed. Structural changes are bracketed by
//! "about to" / "done" [`InsightEvent`]s so list views can follow row by row.

use crate::document::Document;
use crate::ranges::{RangeVec, Ranged};
use std::fmt;
use std::ops::Range;

/// Generation-checked reference to an insight.
///
/// A handle stays comparable after its insight is gone; lookups through it then fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InsightHandle {
    slot: u32,
    generation: u32,
}

/// Category-specific payload of an insight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightKind {
    /// Misspelled word.
    Spelling {
        /// Replacement candidates.
        suggestions: Vec<String>,
    },
    /// Grammar issue.
    Grammar {
        /// Replacement candidates.
        suggestions: Vec<String>,
    },
    /// Typographic issue (quotes, spacing, dashes).
    Typography {
        /// Replacement candidates.
        suggestions: Vec<String>,
    },
    /// A note written by the author.
    Note,
}

impl InsightKind {
    /// Pick a kind from a provider category string.
    ///
    /// Categories mentioning "grammar" or "typograph" (any case) map to those kinds; everything
    /// else is treated as spelling.
    pub fn from_category(category: &str, suggestions: Vec<String>) -> Self {
        let category = category.to_lowercase();
        if category.contains("grammar") {
            Self::Grammar { suggestions }
        } else if category.contains("typograph") {
            Self::Typography { suggestions }
        } else {
            Self::Spelling { suggestions }
        }
    }

    /// Display name of the category.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Spelling { .. } => "Spelling",
            Self::Grammar { .. } => "Grammar",
            Self::Typography { .. } => "Typography",
            Self::Note => "Note",
        }
    }

    /// Replacement candidates, empty for notes.
    pub fn suggestions(&self) -> &[String] {
        match self {
            Self::Spelling { suggestions }
            | Self::Grammar { suggestions }
            | Self::Typography { suggestions } => suggestions,
            Self::Note => &[],
        }
    }

    /// Notes survive re-inspection; automatic findings do not.
    pub fn is_persistent_by_default(&self) -> bool {
        matches!(self, Self::Note)
    }
}

/// What a menu action does when triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightCommand {
    /// Replace the insight's text with the given string.
    ReplaceWith(String),
    /// Drop the insight, leaving the text alone.
    Ignore,
    /// Open the note for editing; handled by the host.
    EditNote,
    /// Remove the insight.
    Remove,
}

/// One entry of an insight's context menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightAction {
    /// Menu label.
    pub label: String,
    /// Action to run.
    pub command: InsightCommand,
}

impl InsightAction {
    fn new(label: impl Into<String>, command: InsightCommand) -> Self {
        Self {
            label: label.into(),
            command,
        }
    }
}

/// Context menu of an insight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightMenu {
    /// Menu title.
    pub title: String,
    /// Actions in display order.
    pub actions: Vec<InsightAction>,
}

/// A range-anchored annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insight {
    range: Range<usize>,
    paragraphs: (usize, usize),
    kind: InsightKind,
    message: String,
    persistent: bool,
}

impl Insight {
    /// Create an insight; persistence follows the kind's default.
    pub fn new(range: Range<usize>, kind: InsightKind, message: impl Into<String>) -> Self {
        let persistent = kind.is_persistent_by_default();
        Self {
            range,
            paragraphs: (0, 0),
            kind,
            message: message.into(),
            persistent,
        }
    }

    /// A persistent note.
    pub fn note(range: Range<usize>, message: impl Into<String>) -> Self {
        Self::new(range, InsightKind::Note, message)
    }

    /// Override the persistence flag.
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    /// Anchored range.
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// First and last paragraph index spanned (0-based).
    pub fn paragraphs(&self) -> (usize, usize) {
        self.paragraphs
    }

    /// Category payload.
    pub fn kind(&self) -> &InsightKind {
        &self.kind
    }

    /// Category name.
    pub fn category(&self) -> &'static str {
        self.kind.category()
    }

    /// Message shown to the user.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Survives [`InsightManager::clear_non_persistent`].
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Context menu for this insight.
    pub fn menu(&self) -> InsightMenu {
        match &self.kind {
            InsightKind::Note => InsightMenu {
                title: "Note".to_string(),
                actions: vec![
                    InsightAction::new("Edit", InsightCommand::EditNote),
                    InsightAction::new("Remove", InsightCommand::Remove),
                ],
            },
            kind => {
                let mut actions: Vec<InsightAction> = kind
                    .suggestions()
                    .iter()
                    .map(|s| {
                        InsightAction::new(
                            format!("Replace with \u{201C}{s}\u{201D}"),
                            InsightCommand::ReplaceWith(s.clone()),
                        )
                    })
                    .collect();
                actions.push(InsightAction::new("Ignore", InsightCommand::Ignore));
                InsightMenu {
                    title: self.message.clone(),
                    actions,
                }
            }
        }
    }
}

/// Why an insight was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// [`InsightManager::erase`].
    Erased,
    /// An edit collapsed its range.
    Collapsed,
    /// Cleared before re-inspection.
    Cleared,
    /// Queued through [`InsightManager::request_removal`].
    Requested,
}

/// Structural change notifications, bracketing every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightEvent {
    /// A row is about to be inserted at `row`.
    AboutToInsert {
        /// Target row.
        row: usize,
    },
    /// A row was inserted.
    Inserted {
        /// Row of the new insight.
        row: usize,
        /// Handle of the new insight.
        handle: InsightHandle,
    },
    /// The insight at `row` is about to be removed.
    AboutToRemove {
        /// Current row.
        row: usize,
        /// Handle of the insight.
        handle: InsightHandle,
        /// Why.
        reason: RemovalReason,
    },
    /// The insight that was at `row` is gone.
    Removed {
        /// Former row.
        row: usize,
        /// Handle of the removed insight.
        handle: InsightHandle,
        /// Why.
        reason: RemovalReason,
    },
    /// The insight at `row` changed in place (message or paragraphs).
    Changed {
        /// Row.
        row: usize,
        /// Handle.
        handle: InsightHandle,
    },
    /// All rows are about to be dropped.
    AboutToReset,
    /// All rows were dropped.
    Reset,
}

/// Callback invoked for every [`InsightEvent`].
pub type InsightCallback = Box<dyn FnMut(&InsightEvent)>;

/// One row of the insight table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightRow {
    /// First paragraph, 1-based.
    pub first: usize,
    /// Last paragraph, 1-based.
    pub last: usize,
    /// Category name.
    pub category: &'static str,
    /// Message.
    pub message: String,
}

#[derive(Debug, Clone)]
struct InsightEntry {
    handle: InsightHandle,
    insight: Insight,
}

impl Ranged for InsightEntry {
    fn range(&self) -> Range<usize> {
        self.insight.range.clone()
    }

    fn set_range(&mut self, range: Range<usize>) {
        self.insight.range = range;
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    occupied: bool,
}

/// Owner of a document's insights.
pub struct InsightManager {
    insights: RangeVec<InsightEntry>,
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    pending_removals: Vec<(InsightHandle, RemovalReason)>,
    callbacks: Vec<InsightCallback>,
}

impl InsightManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self {
            insights: RangeVec::new(),
            slots: Vec::new(),
            free_slots: Vec::new(),
            pending_removals: Vec::new(),
            callbacks: Vec::new(),
        }
    }

    /// Subscribe to structural change events.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&InsightEvent) + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    fn notify(&mut self, event: InsightEvent) {
        for callback in &mut self.callbacks {
            callback(&event);
        }
    }

    fn allocate(&mut self) -> InsightHandle {
        if let Some(slot) = self.free_slots.pop() {
            let entry = &mut self.slots[slot as usize];
            entry.occupied = true;
            return InsightHandle {
                slot,
                generation: entry.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            occupied: true,
        });
        InsightHandle {
            slot: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    fn release(&mut self, handle: InsightHandle) {
        if let Some(slot) = self.slots.get_mut(handle.slot as usize) {
            slot.occupied = false;
            slot.generation = slot.generation.wrapping_add(1);
            self.free_slots.push(handle.slot);
        }
    }

    /// Returns `true` if `handle` refers to a live insight.
    pub fn is_valid(&self, handle: InsightHandle) -> bool {
        self.slots
            .get(handle.slot as usize)
            .is_some_and(|slot| slot.occupied && slot.generation == handle.generation)
    }

    /// Insert keeping range order. Equal ranges keep insertion order.
    ///
    /// An inverted range (`start > end`) is stored with its bounds swapped.
    pub fn insert(&mut self, mut insight: Insight) -> InsightHandle {
        if insight.range.start > insight.range.end {
            tracing::warn!(range = ?insight.range, "inverted insight range, swapping bounds");
            insight.range = insight.range.end..insight.range.start;
        }
        let row = self.insights.insertion_point(&insight.range);
        self.notify(InsightEvent::AboutToInsert { row });

        let handle = self.allocate();
        let row = self.insights.insert(InsightEntry { handle, insight });
        self.notify(InsightEvent::Inserted { row, handle });
        handle
    }

    /// Remove an insight. Stale handles are ignored.
    pub fn erase(&mut self, handle: InsightHandle) -> Option<Insight> {
        self.remove_with_reason(handle, RemovalReason::Erased)
    }

    fn remove_with_reason(&mut self, handle: InsightHandle, reason: RemovalReason) -> Option<Insight> {
        let row = self.row_of(handle)?;
        self.notify(InsightEvent::AboutToRemove { row, handle, reason });

        let entry = self.insights.erase(row)?;
        self.release(handle);
        self.notify(InsightEvent::Removed { row, handle, reason });
        Some(entry.insight)
    }

    /// Remove every insight.
    pub fn clear(&mut self) {
        if self.insights.is_empty() {
            return;
        }
        self.notify(InsightEvent::AboutToReset);
        let handles: Vec<_> = self.insights.iter().map(|e| e.handle).collect();
        self.insights.clear();
        for handle in handles {
            self.release(handle);
        }
        self.pending_removals.clear();
        self.notify(InsightEvent::Reset);
    }

    /// Remove non-persistent insights overlapping `range`. Returns how many were removed.
    ///
    /// An empty `range` removes those containing or touching its position.
    pub fn clear_non_persistent(&mut self, range: Range<usize>) -> usize {
        let doomed: Vec<InsightHandle> = self
            .insights
            .iter()
            .filter(|e| !e.insight.persistent)
            .filter(|e| {
                let r = &e.insight.range;
                if range.is_empty() {
                    r.start <= range.start && range.start <= r.end
                } else {
                    (r.start < range.end && r.end > range.start)
                        || (r.is_empty() && range.contains(&r.start))
                }
            })
            .map(|e| e.handle)
            .collect();

        for &handle in doomed.iter().rev() {
            self.remove_with_reason(handle, RemovalReason::Cleared);
        }
        doomed.len()
    }

    /// First insight whose range contains `pos`.
    pub fn find(&self, pos: usize) -> Option<(InsightHandle, &Insight)> {
        self.insights
            .find(pos)
            .map(|entry| (entry.handle, &entry.insight))
    }

    /// Insight behind `handle`.
    pub fn get(&self, handle: InsightHandle) -> Option<&Insight> {
        self.row_of(handle)
            .and_then(|row| self.insights.get(row))
            .map(|entry| &entry.insight)
    }

    /// Replace the message of an insight (used when editing notes).
    pub fn set_message(&mut self, handle: InsightHandle, message: impl Into<String>) -> bool {
        let Some(row) = self.row_of(handle) else {
            return false;
        };
        let message = message.into();
        self.insights.modify(row, |entry| entry.insight.message = message);
        self.notify(InsightEvent::Changed { row, handle });
        true
    }

    /// Table row currently holding `handle`.
    pub fn row_of(&self, handle: InsightHandle) -> Option<usize> {
        if !self.is_valid(handle) {
            return None;
        }
        self.insights.position(|entry| entry.handle == handle)
    }

    /// Handle at table row `row`.
    pub fn handle_at(&self, row: usize) -> Option<InsightHandle> {
        self.insights.get(row).map(|entry| entry.handle)
    }

    /// Table row contents.
    pub fn row(&self, row: usize) -> Option<InsightRow> {
        self.insights.get(row).map(|entry| {
            let insight = &entry.insight;
            InsightRow {
                first: insight.paragraphs.0 + 1,
                last: insight.paragraphs.1 + 1,
                category: insight.category(),
                message: insight.message.clone(),
            }
        })
    }

    /// Number of insights.
    pub fn len(&self) -> usize {
        self.insights.len()
    }

    /// Returns `true` if there are no insights.
    pub fn is_empty(&self) -> bool {
        self.insights.is_empty()
    }

    /// Insights in range order.
    pub fn iter(&self) -> impl Iterator<Item = (InsightHandle, &Insight)> + '_ {
        self.insights
            .iter()
            .map(|entry| (entry.handle, &entry.insight))
    }

    /// Follow a document edit: shift every range, then auto-remove insights the edit collapsed.
    ///
    /// Only a removal covering a whole non-empty range collapses it. Insights that were already
    /// empty stay.
    pub fn on_document_edited(&mut self, edit_start: usize, delta: isize) {
        if delta == 0 {
            return;
        }
        let collapsed: Vec<InsightHandle> = if delta < 0 {
            let removed = edit_start..edit_start + delta.unsigned_abs();
            self.insights
                .iter()
                .filter(|entry| {
                    let r = &entry.insight.range;
                    !r.is_empty() && removed.start <= r.start && r.end <= removed.end
                })
                .map(|entry| entry.handle)
                .collect()
        } else {
            Vec::new()
        };
        self.insights.shift_positions(edit_start, delta);

        for handle in collapsed {
            tracing::debug!(?handle, "insight range collapsed");
            self.pending_removals.push((handle, RemovalReason::Collapsed));
        }
        self.drain_removals();
    }

    /// Queue an insight for removal at the next [`InsightManager::drain_removals`].
    ///
    /// Safe to call while iterating insights or from inside an action on the insight itself.
    pub fn request_removal(&mut self, handle: InsightHandle) {
        if self.is_valid(handle) && !self.pending_removals.iter().any(|(h, _)| *h == handle) {
            self.pending_removals.push((handle, RemovalReason::Requested));
        }
    }

    /// Number of queued removals.
    pub fn pending_removals(&self) -> usize {
        self.pending_removals.len()
    }

    /// Remove everything queued, emitting the usual events. Returns the removed insights.
    pub fn drain_removals(&mut self) -> Vec<Insight> {
        let pending = std::mem::take(&mut self.pending_removals);
        pending
            .into_iter()
            .filter_map(|(handle, reason)| self.remove_with_reason(handle, reason))
            .collect()
    }

    /// Recompute the paragraph span of every insight against `doc`.
    pub fn refresh_paragraphs(&mut self, doc: &Document) {
        let mut changed = Vec::new();
        for row in 0..self.insights.len() {
            let result = self.insights.modify(row, |entry| {
                let r = &entry.insight.range;
                let first = doc.paragraph_of(r.start);
                let last = doc.paragraph_of(r.end.saturating_sub(1).max(r.start));
                let span = (first, last);
                let differs = entry.insight.paragraphs != span;
                entry.insight.paragraphs = span;
                differs.then_some(entry.handle)
            });
            if let Some((Some(handle), row)) = result {
                changed.push((row, handle));
            }
        }
        for (row, handle) in changed {
            self.notify(InsightEvent::Changed { row, handle });
        }
    }
}

impl Default for InsightManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InsightManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsightManager")
            .field("insights", &self.insights)
            .field("pending_removals", &self.pending_removals)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

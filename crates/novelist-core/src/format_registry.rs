//! Text format registry.
//!
//! The registry owns every [`TextFormat`] of a project, keyed by identities from an
//! [`IdManager`]. Documents store plain [`FormatId`] values; a `FormatId` that is not (or no
//! longer) registered resolves to the reserved default format.

use crate::error::{FormatError, UniquenessError};
use crate::format::TextFormat;
use crate::identity::{Id, IdManager};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Tag type of format identities.
#[derive(Debug)]
pub enum FormatTag {}

/// Weak reference to a registered format.
///
/// Copyable and storable in documents; validity is checked on every lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatId(pub u32);

impl FormatId {
    /// The id of the reserved default format.
    pub const DEFAULT: FormatId = FormatId(0);
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl<T> From<&Id<T>> for FormatId {
    fn from(id: &Id<T>) -> Self {
        FormatId(id.value())
    }
}

/// A registry shared between the documents of one project.
pub type SharedFormatRegistry = Rc<RefCell<TextFormatRegistry>>;

struct FormatEntry {
    id: Id<FormatTag>,
    format: TextFormat,
}

/// Ordered collection of named formats.
///
/// Index order is display order only; lookups go through a side map from id to index.
pub struct TextFormatRegistry {
    entries: Vec<FormatEntry>,
    index_of: HashMap<FormatId, usize>,
    ids: IdManager<FormatTag>,
}

impl TextFormatRegistry {
    /// Name of the reserved default format.
    pub const DEFAULT_NAME: &'static str = "Default";

    /// Create a registry holding only the default format.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::new(),
            index_of: HashMap::new(),
            ids: IdManager::new(),
        };
        registry.push_back(TextFormat::named(Self::DEFAULT_NAME));
        registry
    }

    /// Wrap a new registry for sharing between documents.
    pub fn shared() -> SharedFormatRegistry {
        Rc::new(RefCell::new(Self::new()))
    }

    /// The id of the default format.
    pub fn default_id(&self) -> FormatId {
        FormatId::DEFAULT
    }

    /// The default format definition.
    pub fn default_format(&self) -> &TextFormat {
        self.resolve_format(FormatId::DEFAULT)
    }

    /// Append a format and return its new id.
    pub fn push_back(&mut self, format: TextFormat) -> FormatId {
        let id = self.ids.generate();
        let index = self.entries.len();
        self.insert_entry(index, FormatEntry { id, format })
    }

    /// Insert a format at `index` (`index <= len`).
    pub fn insert(&mut self, index: usize, format: TextFormat) -> Result<FormatId, FormatError> {
        if index > self.entries.len() {
            return Err(FormatError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        let id = self.ids.generate();
        Ok(self.insert_entry(index, FormatEntry { id, format }))
    }

    /// Append a format under a specific id value.
    ///
    /// Used when restoring a registry whose ids were persisted.
    pub fn push_back_with_id(
        &mut self,
        value: u32,
        format: TextFormat,
    ) -> Result<FormatId, UniquenessError> {
        let id = self.ids.request(value)?;
        let index = self.entries.len();
        Ok(self.insert_entry(index, FormatEntry { id, format }))
    }

    fn insert_entry(&mut self, index: usize, entry: FormatEntry) -> FormatId {
        let id = FormatId::from(&entry.id);
        self.entries.insert(index, entry);
        self.reindex_from(index);
        id
    }

    fn reindex_from(&mut self, start: usize) {
        for (idx, entry) in self.entries.iter().enumerate().skip(start) {
            self.index_of.insert(FormatId::from(&entry.id), idx);
        }
    }

    /// Replace the attributes of an existing format.
    pub fn set_text_format(&mut self, id: FormatId, format: TextFormat) -> Result<(), FormatError> {
        let index = self.index_from_id(id).ok_or(FormatError::NotFound(id))?;
        self.entries[index].format = format;
        Ok(())
    }

    /// Look up a format by id.
    pub fn get(&self, id: FormatId) -> Option<&TextFormat> {
        self.index_from_id(id).map(|idx| &self.entries[idx].format)
    }

    /// Look up a format by display index.
    pub fn get_by_index(&self, index: usize) -> Option<&TextFormat> {
        self.entries.get(index).map(|entry| &entry.format)
    }

    /// Display index of `id`.
    pub fn index_from_id(&self, id: FormatId) -> Option<usize> {
        self.index_of.get(&id).copied()
    }

    /// Id of the format at display index `index`.
    pub fn id_from_index(&self, index: usize) -> Option<FormatId> {
        self.entries.get(index).map(|entry| FormatId::from(&entry.id))
    }

    /// Returns `true` if `id` is registered.
    pub fn contains(&self, id: FormatId) -> bool {
        self.index_of.contains_key(&id)
    }

    /// Move the format at `from` to display index `to`. Ids are unchanged.
    pub fn move_format(&mut self, from: usize, to: usize) -> Result<(), FormatError> {
        let len = self.entries.len();
        for index in [from, to] {
            if index >= len {
                return Err(FormatError::IndexOutOfRange { index, len });
            }
        }
        if from == to {
            return Ok(());
        }

        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        self.reindex_from(from.min(to));
        Ok(())
    }

    /// Remove a format and release its id.
    ///
    /// The caller must make sure no open document still uses `id`; fragments that do will
    /// render with the default format afterwards.
    pub fn remove(&mut self, id: FormatId) -> Result<TextFormat, FormatError> {
        if id == FormatId::DEFAULT {
            return Err(FormatError::DefaultFormat);
        }
        let index = self.index_from_id(id).ok_or(FormatError::NotFound(id))?;

        let entry = self.entries.remove(index);
        self.index_of.remove(&id);
        self.reindex_from(index);
        Ok(entry.format)
    }

    /// `id` if registered, otherwise the default id.
    pub fn resolve(&self, id: FormatId) -> FormatId {
        if self.contains(id) {
            id
        } else {
            tracing::warn!(%id, "unknown format id; using default format");
            FormatId::DEFAULT
        }
    }

    /// The format for `id`, or the default format if `id` is unknown.
    pub fn resolve_format(&self, id: FormatId) -> &TextFormat {
        let id = self.resolve(id);
        &self.entries[self.index_of[&id]].format
    }

    /// First format with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<FormatId> {
        self.entries
            .iter()
            .find(|entry| entry.format.name == name)
            .map(|entry| FormatId::from(&entry.id))
    }

    /// First format whose attributes (ignoring the name) equal `format`'s.
    pub fn find_by_attributes(&self, format: &TextFormat) -> Option<FormatId> {
        self.entries
            .iter()
            .find(|entry| entry.format.same_attributes(format))
            .map(|entry| FormatId::from(&entry.id))
    }

    /// Number of registered formats (including the default).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`: the default format is never removed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Formats in display order.
    pub fn iter(&self) -> impl Iterator<Item = (FormatId, &TextFormat)> + '_ {
        self.entries
            .iter()
            .map(|entry| (FormatId::from(&entry.id), &entry.format))
    }
}

impl Default for TextFormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TextFormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|(id, format)| (id, &format.name)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{Alignment, CharacterFormat};

    #[test]
    fn default_format_exists() {
        let registry = TextFormatRegistry::new();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.id_from_index(0), Some(FormatId::DEFAULT));
        assert_eq!(registry.default_format().name, "Default");
    }

    #[test]
    fn push_and_insert_keep_lookup_consistent() {
        let mut registry = TextFormatRegistry::new();
        let a = registry.push_back(TextFormat::named("A"));
        let b = registry.insert(1, TextFormat::named("B")).unwrap();

        assert_eq!(registry.index_from_id(b), Some(1));
        assert_eq!(registry.index_from_id(a), Some(2));
        assert_eq!(registry.get(a).map(|f| f.name.as_str()), Some("A"));
        assert_eq!(registry.get_by_index(1).map(|f| f.name.as_str()), Some("B"));
        assert!(matches!(
            registry.insert(9, TextFormat::named("C")),
            Err(FormatError::IndexOutOfRange { index: 9, len: 3 })
        ));
    }

    #[test]
    fn move_keeps_ids() {
        let mut registry = TextFormatRegistry::new();
        let a = registry.push_back(TextFormat::named("A"));
        let b = registry.push_back(TextFormat::named("B"));
        registry.move_format(2, 0).unwrap();

        assert_eq!(registry.id_from_index(0), Some(b));
        assert_eq!(registry.index_from_id(FormatId::DEFAULT), Some(1));
        assert_eq!(registry.index_from_id(a), Some(2));
    }

    #[test]
    fn remove_releases_id_for_reuse() {
        let mut registry = TextFormatRegistry::new();
        let a = registry.push_back(TextFormat::named("A"));
        let _b = registry.push_back(TextFormat::named("B"));
        registry.remove(a).unwrap();

        assert!(registry.get(a).is_none());
        assert_eq!(registry.resolve(a), FormatId::DEFAULT);
        let c = registry.push_back(TextFormat::named("C"));
        assert_eq!(c, a);
        assert_eq!(registry.remove(FormatId::DEFAULT), Err(FormatError::DefaultFormat));
        assert_eq!(
            registry.remove(FormatId(42)),
            Err(FormatError::NotFound(FormatId(42)))
        );
    }

    #[test]
    fn set_text_format_unknown_id() {
        let mut registry = TextFormatRegistry::new();
        let err = registry
            .set_text_format(FormatId(7), TextFormat::named("X"))
            .unwrap_err();
        assert_eq!(err, FormatError::NotFound(FormatId(7)));
    }

    #[test]
    fn lookup_by_name_and_attributes() {
        let mut registry = TextFormatRegistry::new();
        let bold = TextFormat::named("Bold").with_character(CharacterFormat {
            bold: true,
            ..CharacterFormat::default()
        });
        let id = registry.push_back(bold.clone());
        let centered = registry.push_back(TextFormat::named("Centered").with_alignment(Alignment::Center));

        assert_eq!(registry.find_by_name("Bold"), Some(id));
        assert_eq!(registry.find_by_attributes(&TextFormat { name: "x".into(), ..bold }), Some(id));
        assert_eq!(
            registry.find_by_attributes(&TextFormat::default().with_alignment(Alignment::Center)),
            Some(centered)
        );
    }

    #[test]
    fn push_back_with_requested_id() {
        let mut registry = TextFormatRegistry::new();
        let id = registry.push_back_with_id(5, TextFormat::named("Five")).unwrap();
        assert_eq!(id, FormatId(5));
        assert!(registry.push_back_with_id(0, TextFormat::named("Clash")).is_err());
        // 1..5 were skipped and are handed out first.
        assert_eq!(registry.push_back(TextFormat::named("Next")), FormatId(1));
    }
}

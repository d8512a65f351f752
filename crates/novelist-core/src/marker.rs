//! Text markers: single positions that stay between their neighbouring characters while the
//! document is edited.
//!
//! Insertion exactly at a marker is where [`MarkerAttachment`] matters: a left-attached marker
//! keeps hugging the character before it, a right-attached one moves along with the character
//! after it. When both neighbours are removed the marker lands on the start of the removal and
//! a [`MarkerEvent::Displaced`] is emitted.

use std::collections::BTreeMap;

/// Which neighbouring character a marker sticks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MarkerAttachment {
    /// Stay after the character to the left; text inserted at the marker goes after it.
    #[default]
    Left,
    /// Stay before the character to the right; text inserted at the marker goes before it.
    Right,
}

/// A position in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMarker {
    position: usize,
    attachment: MarkerAttachment,
}

impl TextMarker {
    /// Marker at `position`.
    pub fn new(position: usize, attachment: MarkerAttachment) -> Self {
        Self {
            position,
            attachment,
        }
    }

    /// Current position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Attachment policy.
    pub fn attachment(&self) -> MarkerAttachment {
        self.attachment
    }

    /// Change the attachment policy.
    pub fn set_attachment(&mut self, attachment: MarkerAttachment) {
        self.attachment = attachment;
    }

    /// Follow an edit at `edit_start` (insertion for `delta > 0`, removal otherwise).
    ///
    /// Returns the old position if the removal erased both neighbours of the marker.
    pub fn on_document_edited(&mut self, edit_start: usize, delta: isize) -> Option<usize> {
        let amount = delta.unsigned_abs();
        if delta > 0 {
            let moves = match self.attachment {
                MarkerAttachment::Left => self.position > edit_start,
                MarkerAttachment::Right => self.position >= edit_start,
            };
            if moves {
                self.position += amount;
            }
            return None;
        }

        let edit_end = edit_start + amount;
        if self.position <= edit_start {
            None
        } else if self.position >= edit_end {
            self.position -= amount;
            None
        } else {
            let old = self.position;
            self.position = edit_start;
            Some(old)
        }
    }
}

/// Identifier of a marker in a [`MarkerSet`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(u64);

/// Notifications from a [`MarkerSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerEvent {
    /// The text on both sides of a marker was removed.
    Displaced {
        /// Marker.
        id: MarkerId,
        /// Position before the edit.
        old_position: usize,
        /// Position after the edit.
        position: usize,
    },
    /// Every marker was dropped.
    Reset,
}

/// Callback invoked for every [`MarkerEvent`].
pub type MarkerCallback = Box<dyn FnMut(&MarkerEvent)>;

/// The markers of one document.
#[derive(Default)]
pub struct MarkerSet {
    next_id: u64,
    markers: BTreeMap<MarkerId, TextMarker>,
    callbacks: Vec<MarkerCallback>,
}

impl MarkerSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to marker events.
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&MarkerEvent) + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    fn notify(&mut self, event: MarkerEvent) {
        for callback in &mut self.callbacks {
            callback(&event);
        }
    }

    /// Add a marker. Position validity is up to the caller.
    pub fn insert(&mut self, marker: TextMarker) -> MarkerId {
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        self.markers.insert(id, marker);
        id
    }

    /// Remove a marker.
    pub fn remove(&mut self, id: MarkerId) -> Option<TextMarker> {
        self.markers.remove(&id)
    }

    /// Marker behind `id`.
    pub fn get(&self, id: MarkerId) -> Option<&TextMarker> {
        self.markers.get(&id)
    }

    /// Change the attachment of a marker. Returns `false` for an unknown id.
    pub fn set_attachment(&mut self, id: MarkerId, attachment: MarkerAttachment) -> bool {
        match self.markers.get_mut(&id) {
            Some(marker) => {
                marker.set_attachment(attachment);
                true
            }
            None => false,
        }
    }

    /// Number of markers.
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Returns `true` if there are no markers.
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Markers in id order.
    pub fn iter(&self) -> impl Iterator<Item = (MarkerId, &TextMarker)> + '_ {
        self.markers.iter().map(|(id, marker)| (*id, marker))
    }

    /// Drop every marker.
    pub fn clear(&mut self) {
        if self.markers.is_empty() {
            return;
        }
        self.markers.clear();
        self.notify(MarkerEvent::Reset);
    }

    /// Move every marker along with an edit.
    pub fn on_document_edited(&mut self, edit_start: usize, delta: isize) {
        if delta == 0 {
            return;
        }
        let displaced: Vec<MarkerEvent> = self
            .markers
            .iter_mut()
            .filter_map(|(id, marker)| {
                marker
                    .on_document_edited(edit_start, delta)
                    .map(|old_position| MarkerEvent::Displaced {
                        id: *id,
                        old_position,
                        position: marker.position(),
                    })
            })
            .collect();
        for event in displaced {
            tracing::debug!(?event, "marker displaced");
            self.notify(event);
        }
    }
}

impl std::fmt::Debug for MarkerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerSet")
            .field("markers", &self.markers)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

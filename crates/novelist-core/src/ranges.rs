//! Ordered range container.
//!
//! [`RangeVec`] keeps elements sorted by `(start, end)` in a plain vector and maintains a prefix
//! maximum of `end` values, so point lookups can stop scanning as soon as no earlier element can
//! reach the queried position.

use std::ops::Range;

/// Something that occupies a `[start, end)` range of document positions.
pub trait Ranged {
    /// Current range.
    fn range(&self) -> Range<usize>;
    /// Replace the range. Only the container calls this while shifting.
    fn set_range(&mut self, range: Range<usize>);
}

impl Ranged for Range<usize> {
    fn range(&self) -> Range<usize> {
        self.clone()
    }

    fn set_range(&mut self, range: Range<usize>) {
        *self = range;
    }
}

fn key<T: Ranged>(item: &T) -> (usize, usize) {
    let r = item.range();
    (r.start, r.end)
}

/// Sorted vector of [`Ranged`] elements.
///
/// Elements with equal `(start, end)` keys keep their insertion order.
#[derive(Debug, Clone)]
pub struct RangeVec<T> {
    items: Vec<T>,
    /// `prefix_max_end[i] = max(items[0..=i].end)`
    prefix_max_end: Vec<usize>,
}

impl<T: Ranged> RangeVec<T> {
    /// Create an empty container.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            prefix_max_end: Vec::new(),
        }
    }

    fn rebuild_prefix_max_end_from(&mut self, start_idx: usize) {
        self.prefix_max_end.resize(self.items.len(), 0);
        if self.items.is_empty() {
            return;
        }

        let mut max_end = if start_idx == 0 {
            0
        } else {
            self.prefix_max_end[start_idx - 1]
        };

        for (idx, item) in self.items.iter().enumerate().skip(start_idx) {
            max_end = max_end.max(item.range().end);
            self.prefix_max_end[idx] = max_end;
        }
    }

    /// Insert `item` after every element whose key is less than or equal to its own.
    ///
    /// Returns the index the element landed at.
    pub fn insert(&mut self, item: T) -> usize {
        let pos = self.insertion_point(&item.range());

        self.items.insert(pos, item);
        self.prefix_max_end.insert(pos, 0);
        self.rebuild_prefix_max_end_from(pos);
        pos
    }

    /// Index an element with `range` would be inserted at.
    pub fn insertion_point(&self, range: &Range<usize>) -> usize {
        let new_key = (range.start, range.end);
        self.items.partition_point(|existing| key(existing) <= new_key)
    }

    /// Index of the first element (in sort order) whose range contains `pos`.
    pub fn find_index(&self, pos: usize) -> Option<usize> {
        // Elements past `upper` start after `pos`.
        let upper = self.items.partition_point(|item| item.range().start <= pos);
        // Elements before `lower` all end at or before `pos`.
        let lower = self.prefix_max_end[..upper].partition_point(|&max_end| max_end <= pos);

        (lower..upper).find(|&idx| self.items[idx].range().contains(&pos))
    }

    /// First element (in sort order) whose range contains `pos`.
    pub fn find(&self, pos: usize) -> Option<&T> {
        self.find_index(pos).map(|idx| &self.items[idx])
    }

    /// Indices of every element overlapping `[start, end)`.
    pub fn query_range(&self, start: usize, end: usize) -> Vec<usize> {
        if start >= end {
            return Vec::new();
        }

        let upper = self.items.partition_point(|item| item.range().start < end);
        let lower = self.prefix_max_end[..upper].partition_point(|&max_end| max_end <= start);

        (lower..upper)
            .filter(|&idx| {
                let r = self.items[idx].range();
                r.start < end && r.end > start
            })
            .collect()
    }

    /// Remove and return the element at `index`.
    pub fn erase(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(index);
        self.prefix_max_end.remove(index);
        self.rebuild_prefix_max_end_from(index);
        Some(item)
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.items.clear();
        self.prefix_max_end.clear();
    }

    /// Mutate the element at `index`, re-sorting it if its key changed.
    ///
    /// Returns the closure result and the element's new index.
    pub fn modify<R>(&mut self, index: usize, f: impl FnOnce(&mut T) -> R) -> Option<(R, usize)> {
        let item = self.items.get_mut(index)?;
        let before = key(item);
        let result = f(item);

        if key(&self.items[index]) == before {
            return Some((result, index));
        }

        let item = self.items.remove(index);
        self.prefix_max_end.remove(index);
        self.rebuild_prefix_max_end_from(index);
        let new_index = self.insert(item);
        Some((result, new_index))
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// Index of the first element matching `pred`.
    pub fn position(&self, pred: impl FnMut(&T) -> bool) -> Option<usize> {
        self.items.iter().position(pred)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the container holds no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in sort order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Elements in sort order.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Adjust every range for an edit at `edit_start`.
    ///
    /// A positive `delta` is an insertion of `delta` positions at `edit_start`. A negative
    /// `delta` is the removal of `[edit_start, edit_start - delta)`. Ranges swallowed by a removal
    /// collapse to an empty range at `edit_start`; removing them is up to the owner.
    pub fn shift_positions(&mut self, edit_start: usize, delta: isize) {
        if delta == 0 || self.items.is_empty() {
            return;
        }

        tracing::trace!(edit_start, delta, count = self.items.len(), "shifting ranges");

        let amount = delta.unsigned_abs();
        for item in &mut self.items {
            let r = item.range();
            let shifted = if delta > 0 {
                shift_for_insertion(r, edit_start, amount)
            } else {
                shift_for_removal(r, edit_start, edit_start + amount)
            };
            item.set_range(shifted);
        }

        // Collapsing ranges may reorder keys; `sort_by_key` is stable so ties keep their order.
        self.items.sort_by_key(key);
        self.rebuild_prefix_max_end_from(0);
    }
}

fn shift_for_insertion(r: Range<usize>, pos: usize, len: usize) -> Range<usize> {
    if r.start >= pos {
        r.start + len..r.end + len
    } else if r.end > pos {
        r.start..r.end + len
    } else {
        r
    }
}

fn shift_for_removal(r: Range<usize>, start: usize, end: usize) -> Range<usize> {
    let len = end - start;
    if r.end <= start {
        r
    } else if r.start >= end {
        r.start - len..r.end - len
    } else {
        let new_start = r.start.min(start);
        let new_end = if r.end > end { r.end - len } else { start };
        new_start..new_end.max(new_start)
    }
}

impl<T: Ranged> Default for RangeVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Ranged> IntoIterator for &'a RangeVec<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Tagged {
        range: Range<usize>,
        tag: &'static str,
    }

    impl Ranged for Tagged {
        fn range(&self) -> Range<usize> {
            self.range.clone()
        }

        fn set_range(&mut self, range: Range<usize>) {
            self.range = range;
        }
    }

    fn tagged(range: Range<usize>, tag: &'static str) -> Tagged {
        Tagged { range, tag }
    }

    fn ranges(v: &RangeVec<Range<usize>>) -> Vec<Range<usize>> {
        v.iter().cloned().collect()
    }

    #[test]
    fn insert_keeps_sorted_order() {
        let mut v = RangeVec::new();
        v.insert(10..20);
        v.insert(0..5);
        v.insert(10..12);
        v.insert(3..4);
        assert_eq!(ranges(&v), vec![0..5, 3..4, 10..12, 10..20]);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut v = RangeVec::new();
        v.insert(tagged(2..4, "a"));
        v.insert(tagged(2..4, "b"));
        let idx = v.insert(tagged(2..4, "c"));
        assert_eq!(idx, 2);
        let tags: Vec<_> = v.iter().map(|t| t.tag).collect();
        assert_eq!(tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn find_returns_first_containing() {
        let mut v = RangeVec::new();
        v.insert(0..100);
        v.insert(5..10);
        v.insert(20..30);
        assert_eq!(v.find(7), Some(&(0..100)));
        assert_eq!(v.find(100), None);

        let mut w = RangeVec::new();
        w.insert(5..10);
        w.insert(20..30);
        assert_eq!(w.find(9), Some(&(5..10)));
        assert_eq!(w.find(10), None);
        assert_eq!(w.find(20), Some(&(20..30)));
    }

    #[test]
    fn find_skips_empty_ranges() {
        let mut v = RangeVec::new();
        v.insert(4..4);
        assert_eq!(v.find(4), None);
    }

    #[test]
    fn query_range_uses_half_open_overlap() {
        let mut v = RangeVec::new();
        v.insert(0..5);
        v.insert(5..10);
        v.insert(12..15);
        assert_eq!(v.query_range(5, 12), vec![1]);
        assert_eq!(v.query_range(4, 13), vec![0, 1, 2]);
        assert!(v.query_range(3, 3).is_empty());
    }

    #[test]
    fn insertion_shift() {
        let mut v = RangeVec::new();
        v.insert(0..3);
        v.insert(2..8);
        v.insert(5..7);
        v.shift_positions(5, 4);
        assert_eq!(ranges(&v), vec![0..3, 2..12, 9..11]);
    }

    #[test]
    fn removal_shift_and_collapse() {
        let mut v = RangeVec::new();
        v.insert(0..3);
        v.insert(5..10);
        v.insert(11..14);
        v.insert(20..25);
        // remove [3, 12)
        v.shift_positions(3, -9);
        assert_eq!(ranges(&v), vec![0..3, 3..3, 3..5, 11..16]);
    }

    #[test]
    fn removal_inside_range_shrinks_end() {
        let mut v = RangeVec::new();
        v.insert(2..10);
        v.shift_positions(4, -3);
        assert_eq!(ranges(&v), vec![2..7]);
    }

    #[test]
    fn removal_over_start_clamps_start() {
        let mut v = RangeVec::new();
        v.insert(5..10);
        v.shift_positions(3, -4);
        assert_eq!(ranges(&v), vec![3..6]);
    }

    #[test]
    fn erase_and_modify() {
        let mut v = RangeVec::new();
        v.insert(tagged(0..2, "a"));
        v.insert(tagged(4..6, "b"));
        v.insert(tagged(8..9, "c"));

        let ((), idx) = v.modify(0, |t| t.range = 10..12).unwrap();
        assert_eq!(idx, 2);
        assert_eq!(v.find(5).map(|t| t.tag), Some("b"));

        let removed = v.erase(0).unwrap();
        assert_eq!(removed.tag, "b");
        assert_eq!(v.find(5), None);
        assert_eq!(v.find(11).map(|t| t.tag), Some("a"));
        assert!(v.erase(7).is_none());

        v.clear();
        assert!(v.is_empty());
    }
}

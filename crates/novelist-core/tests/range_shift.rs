//! Randomized range-shift checks for `RangeVec`.

use novelist_core::{RangeVec, Ranged};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::ops::Range;

#[derive(Debug, Clone)]
struct Tagged {
    id: usize,
    range: Range<usize>,
}

impl Ranged for Tagged {
    fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    fn set_range(&mut self, range: Range<usize>) {
        self.range = range;
    }
}

fn random_container(rng: &mut StdRng, len: usize, count: usize) -> RangeVec<Tagged> {
    let mut ranges = RangeVec::new();
    for id in 0..count {
        let start = rng.gen_range(0..len);
        let end = rng.gen_range(start + 1..=len);
        ranges.insert(Tagged { id, range: start..end });
    }
    ranges
}

fn by_id(ranges: &RangeVec<Tagged>) -> HashMap<usize, Range<usize>> {
    ranges.iter().map(|t| (t.id, t.range.clone())).collect()
}

fn assert_sorted(ranges: &RangeVec<Tagged>) {
    let keys: Vec<(usize, usize)> = ranges.iter().map(|t| (t.range.start, t.range.end)).collect();
    assert!(keys.windows(2).all(|w| w[0] <= w[1]), "unsorted: {keys:?}");
}

#[test]
fn test_insertion_shift_rules() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..200 {
        let mut ranges = random_container(&mut rng, 100, 20);
        let before = by_id(&ranges);
        let at = rng.gen_range(0..=100);
        let k = rng.gen_range(1..10);

        ranges.shift_positions(at, k as isize);
        assert_sorted(&ranges);

        for (id, after) in by_id(&ranges) {
            let old = &before[&id];
            if old.start >= at {
                assert_eq!(after, old.start + k..old.end + k);
            } else if old.end <= at {
                assert_eq!(after, old.clone());
            } else {
                assert_eq!(after, old.start..old.end + k);
            }
        }
    }
}

#[test]
fn test_removal_never_inverts_ranges() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..200 {
        let mut ranges = random_container(&mut rng, 100, 20);
        let before = by_id(&ranges);
        let start = rng.gen_range(0..100);
        let end = rng.gen_range(start + 1..=100);
        let len = end - start;

        ranges.shift_positions(start, -(len as isize));
        assert_sorted(&ranges);

        for (id, after) in by_id(&ranges) {
            let old = &before[&id];
            assert!(after.start <= after.end);
            if old.end <= start {
                assert_eq!(after, old.clone());
            } else if old.start >= end {
                assert_eq!(after, old.start - len..old.end - len);
            } else if old.start >= start && old.end <= end {
                assert_eq!(after, start..start);
            } else {
                let kept = old.len() - (old.end.min(end) - old.start.max(start));
                assert_eq!(after.len(), kept);
            }
        }
    }
}

#[test]
fn test_find_matches_linear_scan() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..100 {
        let ranges = random_container(&mut rng, 60, 15);
        for pos in 0..60 {
            let expected = ranges.iter().find(|t| t.range.contains(&pos)).map(|t| t.id);
            assert_eq!(ranges.find(pos).map(|t| t.id), expected);
        }
        let hits = ranges.query_range(10, 20);
        let expected: Vec<usize> = ranges
            .iter()
            .enumerate()
            .filter(|(_, t)| t.range.start < 20 && t.range.end > 10)
            .map(|(idx, _)| idx)
            .collect();
        assert_eq!(hits, expected);
    }
}

#[test]
fn test_modify_resorts_element() {
    let mut ranges: RangeVec<Range<usize>> = RangeVec::new();
    ranges.insert(0..2);
    ranges.insert(4..6);
    ranges.insert(8..9);

    let (_, index) = ranges.modify(0, |r| *r = 7..8).unwrap();
    assert_eq!(index, 1);
    let keys: Vec<Range<usize>> = ranges.iter().cloned().collect();
    assert_eq!(keys, vec![4..6, 7..8, 8..9]);
    assert_eq!(ranges.erase(0), Some(4..6));
    assert_eq!(ranges.find(7), Some(&(7..8)));
}

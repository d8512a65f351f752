//! Randomized checks of identity allocation against a set-based model.

use novelist_core::{Id, IdManager, UniquenessError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

enum Chapter {}

fn smallest_free(live: &BTreeSet<u32>) -> u32 {
    (0..).find(|n| !live.contains(n)).unwrap()
}

#[test]
fn test_generate_always_returns_smallest_free_integer() {
    let mut rng = StdRng::seed_from_u64(42);
    let ids: IdManager<Chapter> = IdManager::new();
    let mut handles: Vec<Id<Chapter>> = Vec::new();
    let mut live = BTreeSet::new();

    for _ in 0..2_000 {
        if handles.is_empty() || rng.gen_bool(0.6) {
            let expected = smallest_free(&live);
            let handle = ids.generate();
            assert_eq!(handle.value(), expected);
            live.insert(expected);
            handles.push(handle);
        } else {
            let victim = handles.swap_remove(rng.gen_range(0..handles.len()));
            live.remove(&victim.value());
        }

        assert_eq!(ids.live_count(), live.len());
        for value in 0..=live.last().copied().unwrap_or(0) {
            assert_eq!(ids.is_live(value), live.contains(&value));
        }
    }
}

#[test]
fn test_generate_and_lifo_release_stay_dense() {
    let mut rng = StdRng::seed_from_u64(7);
    let ids: IdManager<Chapter> = IdManager::new();
    let mut stack: Vec<Id<Chapter>> = Vec::new();

    for _ in 0..1_000 {
        if stack.is_empty() || rng.gen_bool(0.55) {
            stack.push(ids.generate());
        } else {
            stack.pop();
        }
        let max = stack.iter().map(Id::value).max();
        assert!(max.is_none_or(|max| (max as usize) < stack.len()));
    }
}

#[test]
fn test_request_ahead_leaves_gap_then_fills_it() {
    let ids: IdManager<Chapter> = IdManager::new();
    let far = ids.request(5).unwrap();
    let filled: Vec<u32> = (0..5).map(|_| ids.generate()).map(|id| id.value()).collect();
    // Handles were dropped right away, so every generate reused 0.
    assert_eq!(filled, vec![0, 0, 0, 0, 0]);

    let kept: Vec<Id<Chapter>> = (0..5).map(|_| ids.generate()).collect();
    let values: Vec<u32> = kept.iter().map(Id::value).collect();
    assert_eq!(values, vec![0, 1, 2, 3, 4]);
    assert_eq!(ids.generate().value(), 6);
    assert_eq!(far.value(), 5);
}

#[test]
fn test_request_of_live_value_is_uniqueness_error() {
    let ids: IdManager<Chapter> = IdManager::new();
    let held = ids.generate();
    assert_eq!(ids.request(held.value()).unwrap_err(), UniquenessError { id: 0 });

    drop(held);
    assert!(ids.request(0).is_ok());
}

#[test]
fn test_request_of_reserved_maximum_is_rejected() {
    let ids: IdManager<Chapter> = IdManager::new();
    assert_eq!(ids.request(u32::MAX).unwrap_err(), UniquenessError { id: u32::MAX });
    assert_eq!(ids.live_count(), 0);

    let held = ids.generate();
    assert_eq!(held.value(), 0);
}

#[test]
fn test_handles_outliving_manager_release_quietly() {
    let ids: IdManager<Chapter> = IdManager::new();
    let handle = ids.generate();
    drop(ids);
    assert_eq!(handle.value(), 0);
    drop(handle);
}

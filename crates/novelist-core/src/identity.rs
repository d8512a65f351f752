//! Identity manager: dense, reusable integer handles scoped by a tag type.
//!
//! An [`IdManager<Tag>`] hands out move-only [`Id<Tag>`] values. Dropping an `Id` returns its
//! integer to the pool. Releasing the highest issued integer retracts the pool's counter instead
//! of growing the free list, so typical generate/release sequences stay dense.

use crate::error::UniquenessError;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

#[derive(Debug, Default)]
struct IdPool {
    /// First integer never handed out.
    next: u32,
    /// Released integers below `next`.
    free: BTreeSet<u32>,
}

impl IdPool {
    fn generate(&mut self) -> u32 {
        if let Some(value) = self.free.pop_first() {
            return value;
        }
        let value = self.next;
        self.next += 1;
        value
    }

    /// `u32::MAX` is never issued: it bounds the counter and is always reported as taken.
    fn request(&mut self, value: u32) -> Result<u32, UniquenessError> {
        if value >= self.next {
            let next = value.checked_add(1).ok_or(UniquenessError { id: value })?;
            self.free.extend(self.next..value);
            self.next = next;
            return Ok(value);
        }

        if self.free.remove(&value) {
            Ok(value)
        } else {
            Err(UniquenessError { id: value })
        }
    }

    fn release(&mut self, value: u32) {
        if value.checked_add(1) == Some(self.next) {
            self.next = value;
            self.retract();
        } else if value < self.next {
            self.free.insert(value);
        }
    }

    /// Pull `next` down over any released integers directly below it.
    fn retract(&mut self) {
        while let Some(&last) = self.free.last() {
            if last + 1 != self.next {
                break;
            }
            self.free.pop_last();
            self.next = last;
        }
    }

    fn is_live(&self, value: u32) -> bool {
        value < self.next && !self.free.contains(&value)
    }

    fn live_count(&self) -> usize {
        self.next as usize - self.free.len()
    }
}

/// Pool of integer identities for one tag type.
///
/// The manager is neither `Clone` nor `Copy`; handles keep a weak back-reference to the pool so
/// that they can outlive it safely (their release then becomes a no-op).
pub struct IdManager<Tag> {
    pool: Rc<RefCell<IdPool>>,
    _tag: PhantomData<fn() -> Tag>,
}

impl<Tag> IdManager<Tag> {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            pool: Rc::new(RefCell::new(IdPool::default())),
            _tag: PhantomData,
        }
    }

    /// Issue the smallest integer that is not currently live.
    pub fn generate(&self) -> Id<Tag> {
        let value = self.pool.borrow_mut().generate();
        self.handle(value)
    }

    /// Claim `value` specifically.
    ///
    /// Fails with [`UniquenessError`] if `value` is already held by a live handle, or if it is
    /// `u32::MAX`, which the pool reserves.
    pub fn request(&self, value: u32) -> Result<Id<Tag>, UniquenessError> {
        let value = self.pool.borrow_mut().request(value)?;
        Ok(self.handle(value))
    }

    /// Returns `true` if a live handle currently holds `value`.
    pub fn is_live(&self, value: u32) -> bool {
        self.pool.borrow().is_live(value)
    }

    /// Number of live handles.
    pub fn live_count(&self) -> usize {
        self.pool.borrow().live_count()
    }

    fn handle(&self, value: u32) -> Id<Tag> {
        Id {
            value,
            pool: Rc::downgrade(&self.pool),
            _tag: PhantomData,
        }
    }
}

impl<Tag> Default for IdManager<Tag> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tag> fmt::Debug for IdManager<Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pool = self.pool.borrow();
        f.debug_struct("IdManager")
            .field("next", &pool.next)
            .field("free", &pool.free)
            .finish()
    }
}

/// A move-only integer identity issued by an [`IdManager`].
pub struct Id<Tag> {
    value: u32,
    pool: Weak<RefCell<IdPool>>,
    _tag: PhantomData<fn() -> Tag>,
}

impl<Tag> Id<Tag> {
    /// The integer held by this handle.
    pub fn value(&self) -> u32 {
        self.value
    }
}

impl<Tag> Drop for Id<Tag> {
    fn drop(&mut self) {
        let Some(pool) = self.pool.upgrade() else {
            return;
        };
        match pool.try_borrow_mut() {
            Ok(mut pool) => pool.release(self.value),
            Err(_) => tracing::warn!(id = self.value, "identity pool busy; id leaked"),
        }
    }
}

impl<Tag> PartialEq for Id<Tag> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && Weak::ptr_eq(&self.pool, &other.pool)
    }
}

impl<Tag> Eq for Id<Tag> {}

impl<Tag> Hash for Id<Tag> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<Tag> fmt::Debug for Id<Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

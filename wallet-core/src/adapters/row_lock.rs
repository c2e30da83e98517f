//! In-process row locks keyed by account id
//!
//! A lock is held by a [`RowGuard`] and released when the guard drops.
//! Waiting on one account never blocks callers of another account; the
//! shared table mutex is only held while inspecting the held set.

use std::collections::HashSet;
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use uuid::Uuid;

#[derive(Debug, Default)]
pub struct RowLocks {
    held: Mutex<HashSet<Uuid>>,
    released: Condvar,
}

impl RowLocks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Block until the row for `id` is free, then take it
    pub fn acquire(self: &Arc<Self>, id: Uuid) -> RowGuard {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while held.contains(&id) {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(id);
        RowGuard {
            locks: Arc::clone(self),
            id,
        }
    }

    fn release(&self, id: Uuid) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        held.remove(&id);
        drop(held);
        self.released.notify_all();
    }

    #[cfg(test)]
    fn is_held(&self, id: Uuid) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }
}

/// Ownership of one account row until dropped
#[derive(Debug)]
pub struct RowGuard {
    locks: Arc<RowLocks>,
    id: Uuid,
}

impl RowGuard {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for RowGuard {
    fn drop(&mut self) {
        self.locks.release(self.id);
    }
}

/// Row guards held by one unit of work
#[derive(Debug, Default)]
pub struct HeldRows(Vec<RowGuard>);

impl HeldRows {
    /// Take the row lock for `id` unless this unit already holds it.
    /// Returns true when a new lock was acquired.
    pub fn lock(&mut self, locks: &Arc<RowLocks>, id: Uuid) -> bool {
        if self.0.iter().any(|g| g.id() == id) {
            return false;
        }
        self.0.push(locks.acquire(id));
        true
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

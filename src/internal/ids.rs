use std::{
    collections::HashSet,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::ListenerId;

/// Allocates unique listener ids.
///
/// Ids come from a monotonic counter, so a live id can never be reissued and
/// no collision-retry loop is needed. The live set exists so that freed ids
/// can be told apart from active ones; it is guarded by its own mutex and the
/// lock is held only for the insert/remove.
pub(crate) struct IdAllocator {
    next: AtomicU64,
    live: Mutex<HashSet<u64>>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            live: Mutex::new(HashSet::new()),
        }
    }

    /// Returns a fresh id and marks it in-use.
    ///
    /// # Panics
    ///
    /// Panics if the freshly drawn id is already live. Unreachable with a
    /// monotonic counter; an occurrence would mean the uniqueness invariant
    /// is broken.
    pub fn allocate(&self) -> ListenerId {
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        let fresh = self.lock_live().insert(raw);
        assert!(fresh, "listener id {raw} issued twice");
        ListenerId::new(raw)
    }

    /// Clears the in-use mark. Freeing an unknown id is a no-op.
    pub fn free(&self, id: ListenerId) {
        self.lock_live().remove(&id.raw());
    }

    #[cfg(test)]
    pub fn in_use(&self, id: ListenerId) -> bool {
        self.lock_live().contains(&id.raw())
    }

    fn lock_live(&self) -> MutexGuard<'_, HashSet<u64>> {
        self.live.lock().expect("id allocator lock poisoned")
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

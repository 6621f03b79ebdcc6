//! Handle table
//!
//! The guest names host resources by integer alone, so the table is the
//! sole survivor of host-object identity across the boundary. Handles come
//! from a monotonic counter and are never reissued: a stale handle stays
//! stale forever instead of silently aliasing a newer resource. Absence is
//! an expected outcome, not an error - the guest may legitimately race its
//! own teardown.
//!
//! Single-writer, single-reader by construction (one guest call or host
//! callback at a time), so no synchronization.

use std::collections::HashMap;

/// A guest-visible resource identifier. Non-negative once issued;
/// [`crate::bridge::INVALID_HANDLE`] is the creation-failure sentinel.
pub type Handle = i32;

/// Integer-keyed registry of live host resources.
pub struct HandleTable<R> {
    next: Handle,
    entries: HashMap<Handle, R>,
}

impl<R> HandleTable<R> {
    pub fn new() -> Self {
        Self {
            next: 0,
            entries: HashMap::new(),
        }
    }

    /// Register a resource and issue its handle.
    pub fn insert(&mut self, resource: R) -> Handle {
        let handle = self.next;
        self.next += 1;
        self.entries.insert(handle, resource);
        handle
    }

    pub fn get(&self, handle: Handle) -> Option<&R> {
        self.entries.get(&handle)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut R> {
        self.entries.get_mut(&handle)
    }

    /// Remove an entry, returning it if it was present. Idempotent.
    pub fn remove(&mut self, handle: Handle) -> Option<R> {
        self.entries.remove(&handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<R> Default for HandleTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_unique() {
        let mut table = HandleTable::new();
        let a = table.insert("a");
        let b = table.insert("b");
        assert_ne!(a, b);
        assert_eq!(table.get(a), Some(&"a"));
        assert_eq!(table.get(b), Some(&"b"));
    }

    #[test]
    fn test_get_after_remove_is_absent() {
        let mut table = HandleTable::new();
        let handle = table.insert(42);
        assert_eq!(table.remove(handle), Some(42));
        assert_eq!(table.get(handle), None);
        assert!(!table.contains(handle));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut table = HandleTable::new();
        let handle = table.insert(1);
        assert_eq!(table.remove(handle), Some(1));
        assert_eq!(table.remove(handle), None);
        assert_eq!(table.remove(9999), None);
    }

    #[test]
    fn test_handles_are_never_reused() {
        let mut table = HandleTable::new();
        let mut issued = Vec::new();

        // Interleave inserts and removes; every handle must stay distinct.
        for round in 0..10 {
            let a = table.insert(round);
            let b = table.insert(round);
            table.remove(a);
            issued.push(a);
            issued.push(b);
        }

        let mut deduped = issued.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), issued.len());
    }

    #[test]
    fn test_removed_handle_value_never_reappears() {
        let mut table = HandleTable::new();
        let first = table.insert("first");
        table.remove(first);

        for _ in 0..100 {
            let handle = table.insert("later");
            assert_ne!(handle, first);
        }
    }

    #[test]
    fn test_negative_handles_are_absent() {
        let mut table = HandleTable::new();
        table.insert("x");
        assert_eq!(table.get(-1), None);
        assert_eq!(table.get(i32::MIN), None);
    }

    #[test]
    fn test_len_tracks_live_entries() {
        let mut table = HandleTable::new();
        assert!(table.is_empty());
        let a = table.insert(1);
        let _b = table.insert(2);
        assert_eq!(table.len(), 2);
        table.remove(a);
        assert_eq!(table.len(), 1);
    }
}

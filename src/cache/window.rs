//! Bounded most-recently-used retention window
//!
//! Entries past capacity are evicted oldest first, but only once nothing
//! outside the window still holds the value.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::types::Fingerprint;

pub(crate) struct RecentWindow<V> {
    capacity: usize,
    // least recently used at the front
    entries: VecDeque<(Fingerprint, Arc<V>)>,
}

impl<V> RecentWindow<V> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    /// Look up an entry and mark it most recently used
    pub(crate) fn get(&mut self, fingerprint: &Fingerprint) -> Option<Arc<V>> {
        let index = self.position(fingerprint)?;
        let entry = self.entries.remove(index)?;
        let value = Arc::clone(&entry.1);
        self.entries.push_back(entry);
        Some(value)
    }

    pub(crate) fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.position(fingerprint).is_some()
    }

    pub(crate) fn insert(&mut self, fingerprint: Fingerprint, value: Arc<V>) {
        if let Some(index) = self.position(&fingerprint) {
            self.entries.remove(index);
        }
        self.entries.push_back((fingerprint, value));
        self.evict();
    }

    pub(crate) fn remove(&mut self, fingerprint: &Fingerprint) -> Option<Arc<V>> {
        let index = self.position(fingerprint)?;
        self.entries.remove(index).map(|(_, value)| value)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn position(&self, fingerprint: &Fingerprint) -> Option<usize> {
        self.entries.iter().position(|(fp, _)| fp == fingerprint)
    }

    fn evict(&mut self) {
        while self.entries.len() > self.capacity {
            let unreferenced = self
                .entries
                .iter()
                .position(|(_, value)| Arc::strong_count(value) == 1);
            match unreferenced {
                Some(index) => {
                    self.entries.remove(index);
                }
                // everything is still in use by a view
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GraphId, ProjectionKey};

    fn fp(n: u32) -> Fingerprint {
        ProjectionKey::new(GraphId::from(format!("g{}", n)), Default::default(), false).fingerprint()
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut window = RecentWindow::new(2);
        window.insert(fp(1), Arc::new(1));
        window.insert(fp(2), Arc::new(2));

        // touch 1 so 2 becomes the oldest
        assert!(window.get(&fp(1)).is_some());
        window.insert(fp(3), Arc::new(3));

        assert_eq!(window.len(), 2);
        assert!(window.contains(&fp(1)));
        assert!(!window.contains(&fp(2)));
        assert!(window.contains(&fp(3)));
    }

    #[test]
    fn test_referenced_entries_survive_eviction() {
        let mut window = RecentWindow::new(1);
        let held = Arc::new(1);
        window.insert(fp(1), Arc::clone(&held));
        window.insert(fp(2), Arc::new(2));

        // fp(1) is still held outside, so the unreferenced fp(2) goes instead
        assert!(window.contains(&fp(1)));
        assert!(!window.contains(&fp(2)));

        drop(held);
        window.insert(fp(3), Arc::new(3));
        assert!(!window.contains(&fp(1)));
        assert!(window.contains(&fp(3)));
    }

    #[test]
    fn test_window_overflows_while_all_referenced() {
        let mut window = RecentWindow::new(1);
        let a = Arc::new(1);
        let b = Arc::new(2);
        window.insert(fp(1), Arc::clone(&a));
        window.insert(fp(2), Arc::clone(&b));
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut window = RecentWindow::new(4);
        window.insert(fp(1), Arc::new(1));
        window.insert(fp(2), Arc::new(2));

        assert_eq!(window.remove(&fp(1)).as_deref(), Some(&1));
        assert!(window.remove(&fp(1)).is_none());

        window.clear();
        assert_eq!(window.len(), 0);
    }
}

//! # Time-ordered queue of scheduled entries.
//!
//! [`Agenda`] keeps [`Scheduled`] entries sorted ascending by due instant so
//! that the front is always the earliest-due entry. Insertion is a binary
//! search plus shift; removal is from the front only, matching the dispatch
//! loop's access pattern.

use std::collections::VecDeque;

use super::scheduled::Scheduled;

/// Capacity below which the backing storage is never shrunk.
const COMPACT_MIN_CAPACITY: usize = 64;

/// A sorted collection of [`Scheduled`] entries, earliest due first.
///
/// Invariant: the front entry has the minimum due instant in the
/// collection. Entries with equal due instants keep insertion order.
#[derive(Debug)]
pub struct Agenda<T> {
    entries: VecDeque<Scheduled<T>>,
}

impl<T> Default for Agenda<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Agenda<T> {
    /// Creates an empty agenda.
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Inserts an entry at the position that preserves ascending due-instant
    /// order. Entries with the same due instant land after existing ones.
    pub fn insert(&mut self, entry: Scheduled<T>) {
        let idx = self.entries.partition_point(|e| e.at <= entry.at);
        self.entries.insert(idx, entry);
    }

    /// Returns the earliest-due entry without removing it.
    pub fn peek(&self) -> Option<&Scheduled<T>> {
        self.entries.front()
    }

    /// Removes and returns the earliest-due entry, then compacts.
    pub fn pop_front(&mut self) -> Option<Scheduled<T>> {
        let entry = self.entries.pop_front();
        self.compact();
        entry
    }

    /// Number of entries waiting for dispatch.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no entries are waiting.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reclaims backing storage after removals from the front.
    ///
    /// Trigger: capacity of at least [`COMPACT_MIN_CAPACITY`] with at most a
    /// quarter of it in use; the queue then shrinks to twice its current
    /// length. Keeps a long-lived scheduler from retaining the high-water
    /// capacity of a past burst.
    fn compact(&mut self) {
        let len = self.entries.len();
        if self.entries.capacity() >= COMPACT_MIN_CAPACITY && len * 4 <= self.entries.capacity() {
            self.entries.shrink_to(len * 2);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::Rng;
    use tokio::time::Instant;

    use super::*;

    fn entry(base: Instant, offset_ms: u64, task: u32) -> Scheduled<u32> {
        Scheduled::at(base + Duration::from_millis(offset_ms), task)
    }

    #[test]
    fn test_random_insertion_yields_ascending_order() {
        let base = Instant::now();
        let mut rng = rand::rng();
        let mut agenda = Agenda::new();

        for task in 0..1000 {
            agenda.insert(entry(base, rng.random_range(0..86_400_000), task));
        }
        assert_eq!(agenda.len(), 1000);

        let mut prev: Option<Instant> = None;
        while let Some(e) = agenda.pop_front() {
            let at = e.at.unwrap();
            if let Some(p) = prev {
                assert!(at >= p, "entries must come out in ascending order");
            }
            prev = Some(at);
        }
    }

    #[test]
    fn test_equal_instants_keep_insertion_order() {
        let base = Instant::now();
        let mut agenda = Agenda::new();

        agenda.insert(entry(base, 10, 1));
        agenda.insert(entry(base, 10, 2));
        agenda.insert(entry(base, 5, 0));
        agenda.insert(entry(base, 10, 3));

        let order: Vec<u32> = std::iter::from_fn(|| agenda.pop_front().map(|e| e.task)).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_peek_returns_earliest_without_removal() {
        let base = Instant::now();
        let mut agenda = Agenda::new();
        agenda.insert(entry(base, 50, 2));
        agenda.insert(entry(base, 10, 1));

        assert_eq!(agenda.peek().map(|e| e.task), Some(1));
        assert_eq!(agenda.len(), 2);
    }

    #[test]
    fn test_compaction_releases_burst_capacity() {
        let base = Instant::now();
        let mut agenda = Agenda::new();

        for task in 0..1024 {
            agenda.insert(entry(base, u64::from(task), task));
        }
        let burst_capacity = agenda.entries.capacity();
        assert!(burst_capacity >= 1024);

        for _ in 0..1000 {
            agenda.pop_front();
        }

        assert_eq!(agenda.len(), 24);
        assert!(
            agenda.entries.capacity() < burst_capacity,
            "capacity should shrink after draining the burst"
        );

        // Remaining entries are untouched by compaction.
        let order: Vec<u32> = std::iter::from_fn(|| agenda.pop_front().map(|e| e.task)).collect();
        assert_eq!(order, (1000..1024).collect::<Vec<u32>>());
    }

    #[test]
    fn test_empty_agenda() {
        let mut agenda: Agenda<u32> = Agenda::new();
        assert!(agenda.is_empty());
        assert!(agenda.peek().is_none());
        assert!(agenda.pop_front().is_none());
    }
}

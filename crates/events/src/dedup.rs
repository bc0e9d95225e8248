//! Bounded event-id dedup window.
//!
//! The broker delivers at least once, and the ledger stores aggregate counts
//! rather than a log of which seat moved, so replaying a duplicate
//! `seat.reserved` would double-decrement. Tracking recently seen event ids
//! and dropping repeats is a correctness requirement for ingestion, not an
//! optimization. Retention is bounded: ids are evicted FIFO once the window
//! is full.

use std::collections::{HashSet, VecDeque};

use uuid::Uuid;

#[derive(Debug)]
pub struct DedupWindow {
    seen: HashSet<Uuid>,
    order: VecDeque<Uuid>,
    capacity: usize,
}

impl DedupWindow {
    /// A zero capacity would turn every duplicate into a replay, so it is
    /// bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            seen: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an event id. Returns `true` on first sighting, `false` for a
    /// duplicate still inside the retention window.
    pub fn observe(&mut self, event_id: Uuid) -> bool {
        if self.seen.contains(&event_id) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
        self.order.push_back(event_id);
        self.seen.insert(event_id);
        true
    }

    pub fn contains(&self, event_id: Uuid) -> bool {
        self.seen.contains(&event_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

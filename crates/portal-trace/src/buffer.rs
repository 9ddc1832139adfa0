//! Bounded event buffer

use crate::event::TraceEvent;
use std::collections::VecDeque;

/// Ring of the most recent events, oldest first
#[derive(Debug, Clone)]
pub struct TraceBuffer {
    events: VecDeque<TraceEvent>,
    capacity: usize,
    dropped: u64,
}

impl TraceBuffer {
    /// Buffer holding at most `capacity` events (at least one)
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            dropped: 0,
        }
    }

    /// Append, evicting the oldest event when full
    pub fn push(&mut self, event: TraceEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    /// Remove every event
    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped = 0;
    }

    /// Events, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &TraceEvent> {
        self.events.iter()
    }

    /// Copy of the events, oldest first
    #[must_use]
    pub fn to_vec(&self) -> Vec<TraceEvent> {
        self.events.iter().cloned().collect()
    }

    /// Number of buffered events
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// No buffered events
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Maximum number of events
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events evicted since the last clear
    #[inline]
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

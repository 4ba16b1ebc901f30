//! Append-only physical storage for events.
//!
//! The log holds every activation/deactivation transition since version 0,
//! laid out in ascending version order. The version map owns the
//! version-to-range bookkeeping; the log itself only knows about positions.

use crate::types::Event;

/// Ordered sequence of events, physically sorted by producing version.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pre-sized log holding `size` placeholder slots, to be filled with
    /// [`EventLog::insert_at`] during the one-time counting-sort build.
    pub fn with_len(size: usize) -> Self {
        Self {
            events: vec![Event::insert(0); size],
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Add one event at the tail.
    pub fn append(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Write `event` into an exact slot of a pre-sized log.
    ///
    /// Only used while placing events during the counting-sort build; the
    /// slot must already exist.
    pub fn insert_at(&mut self, event: Event, index: usize) {
        self.events[index] = event;
    }

    /// Bulk tail append for a freshly registered version.
    pub fn append_range(&mut self, events: &[Event]) {
        self.events.extend_from_slice(events);
    }

    /// Read-only view over `[start, end)`.
    ///
    /// The view must not be retained across a subsequent mutation; indices
    /// outside `[0, len]` are a caller contract violation.
    pub fn range(&self, start: usize, end: usize) -> &[Event] {
        debug_assert!(start <= end && end <= self.events.len());
        &self.events[start..end]
    }
}

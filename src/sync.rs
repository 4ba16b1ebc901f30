//! Thread-safe wrapper for concurrent index access.
//!
//! This module provides `SyncTimeline`, a thread-safe wrapper around
//! `TimelineIndex` that uses `Arc<RwLock<TimelineIndex>>` internally to
//! allow safe concurrent access from multiple threads.
//!
//! # Features
//!
//! Enable the `sync` feature to use this module:
//!
//! ```toml
//! [dependencies]
//! tempora = { version = "0.1", features = ["sync"] }
//! ```
//!
//! # Examples
//!
//! ```rust
//! use tempora::sync::SyncTimeline;
//! use tempora::{LifeSpan, TemporalTable, TimelineIndex};
//! use std::thread;
//!
//! let mut table = TemporalTable::new(2);
//! table.push(vec![1], LifeSpan::open(0));
//!
//! let index = SyncTimeline::new(TimelineIndex::new(table));
//! let reader = index.clone();
//!
//! let handle = thread::spawn(move || reader.time_travel(1).unwrap());
//!
//! assert_eq!(index.time_travel(0).unwrap().len(), 1);
//! assert_eq!(handle.join().unwrap().len(), 1);
//! ```

use crate::error::Result;
use crate::index::TimelineIndex;
use crate::table::Row;
use crate::types::{Event, IndexStats, Version};
use parking_lot::RwLock;
use std::sync::Arc;

/// Thread-safe wrapper around `TimelineIndex` using `Arc<RwLock<_>>`.
///
/// Queries (`time_travel`, aggregates) take the read lock and may run
/// concurrently; `append_version` takes the write lock and excludes every
/// reader for its duration.
#[derive(Clone)]
pub struct SyncTimeline {
    inner: Arc<RwLock<TimelineIndex>>,
}

impl SyncTimeline {
    pub fn new(index: TimelineIndex) -> Self {
        Self {
            inner: Arc::new(RwLock::new(index)),
        }
    }

    pub fn current_version(&self) -> Version {
        self.inner.read().current_version()
    }

    pub fn stats(&self) -> IndexStats {
        self.inner.read().stats()
    }

    pub fn time_travel(&self, version: Version) -> Result<Vec<Row>> {
        self.inner.read().time_travel(version)
    }

    pub fn temporal_sum(&self, column: usize) -> Result<Vec<u64>> {
        self.inner.read().temporal_sum(column)
    }

    pub fn temporal_max(&self, column: usize) -> Result<Vec<u64>> {
        self.inner.read().temporal_max(column)
    }

    pub fn append_version(&self, events: &[Event]) {
        self.inner.write().append_version(events)
    }

    /// Derive a joined index while both inputs are read-locked.
    pub fn temporal_join(&self, other: &SyncTimeline) -> Result<SyncTimeline> {
        let joined = self.inner.read().temporal_join(&*other.inner.read())?;
        Ok(Self::new(joined))
    }

    /// Access the underlying index directly for a batch of reads.
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, TimelineIndex> {
        self.inner.read()
    }

    /// Access the underlying index directly for a batch of mutations.
    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, TimelineIndex> {
        self.inner.write()
    }
}

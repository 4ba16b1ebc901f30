//! Version-to-event-range mapping.
//!
//! The version map owns the event log plus a cumulative offset array built
//! with one counting-sort pass over the table. Versions count upwards from
//! zero, so a plain vector beats any tree or hash map here: `offsets[v]` is
//! the number of events with version strictly below `v`, and the events of
//! version `v` occupy `[offsets[v], offsets[v + 1])` of the log.

use crate::error::{Result, TemporaError};
use crate::event_log::EventLog;
use crate::table::TemporalTable;
use crate::types::{Event, Version};

/// Maps versions to contiguous ranges of the event log.
///
/// Invariant: `offsets.len() == current_version + 2`, so the half-open
/// range lookup `[offsets[v], offsets[v + 1])` is defined for every version
/// in `[0, current_version]`.
#[derive(Debug, Clone)]
pub struct VersionMap {
    log: EventLog,
    offsets: Vec<usize>,
    current_version: Version,
    event_count: usize,
}

impl VersionMap {
    /// A map covering no versions yet; the starting point for join-result
    /// indexes that grow one [`VersionMap::register_version`] at a time.
    pub fn empty() -> Self {
        Self {
            log: EventLog::new(),
            offsets: vec![0, 0],
            current_version: 0,
            event_count: 0,
        }
    }

    /// Build the map over a table with one counting-sort pass.
    ///
    /// The first pass tallies how many events each version produces (shifted
    /// by one slot so the prefix sum lands on range starts), the prefix sum
    /// turns tallies into offsets, and the placement pass writes each row's
    /// events into a pre-sized log, reusing a copy of the offsets as running
    /// write cursors.
    pub fn build(table: &TemporalTable) -> Self {
        let next_version = table.next_version() as usize;
        let event_count = table.event_count();

        let mut offsets = vec![0usize; next_version + 2];
        for (_, lifespan) in table.lifespans() {
            offsets[lifespan.start as usize + 1] += 1;
            if let Some(end) = lifespan.end {
                offsets[end as usize + 1] += 1;
            }
        }

        for i in 1..offsets.len() {
            offsets[i] += offsets[i - 1];
        }

        let mut log = EventLog::with_len(event_count);
        let mut cursors = offsets.clone();
        for (id, lifespan) in table.lifespans() {
            let start = lifespan.start as usize;
            log.insert_at(Event::insert(id), cursors[start]);
            cursors[start] += 1;

            if let Some(end) = lifespan.end {
                let end = end as usize;
                log.insert_at(Event::delete(id), cursors[end]);
                cursors[end] += 1;
            }
        }

        log::debug!(
            "version map built: {} versions, {} events",
            next_version,
            event_count
        );

        Self {
            log,
            offsets,
            current_version: next_version as Version,
            event_count,
        }
    }

    /// Highest version the map knows about.
    pub fn current_version(&self) -> Version {
        self.current_version
    }

    /// Total number of events across all versions.
    pub fn event_count(&self) -> usize {
        self.event_count
    }

    /// Number of events with version strictly below `v`.
    fn offset(&self, v: Version) -> usize {
        self.offsets[v as usize]
    }

    /// Events produced by exactly `version`.
    pub fn events_for(&self, version: Version) -> Result<&[Event]> {
        self.events_in(version, version + 1)
    }

    /// Events with version in the half-open range `[start, end)`.
    pub fn events_in(&self, start: Version, end: Version) -> Result<&[Event]> {
        if start > end || end > self.current_version + 1 {
            return Err(TemporaError::InvalidVersion {
                requested: end.saturating_sub(1),
                current: self.current_version,
            });
        }
        Ok(self.events_slice(start, end))
    }

    /// Range lookup with the bounds already validated by the caller.
    pub(crate) fn events_slice(&self, start: Version, end: Version) -> &[Event] {
        debug_assert!(start <= end && (end as usize) < self.offsets.len());
        self.log.range(self.offset(start), self.offset(end))
    }

    /// Append one new version's worth of events at the tail.
    ///
    /// The events become part of version `current_version`, after which the
    /// map advances by exactly one version. Empty versions are legal and
    /// keep the version axis dense.
    pub fn register_version(&mut self, events: &[Event]) {
        self.log.append_range(events);
        self.event_count += events.len();

        // The closing offset of the now-complete version and the sentinel
        // for the next one are both "all events so far".
        let last = self.offsets.len() - 1;
        self.offsets[last] = self.event_count;
        self.offsets.push(self.event_count);
        self.current_version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LifeSpan;

    fn sample_table() -> TemporalTable {
        let mut table = TemporalTable::new(6);
        table.push(vec![1], LifeSpan::new(0, 4));
        table.push(vec![2], LifeSpan::open(2));
        table.push(vec![3], LifeSpan::new(3, 5));
        table
    }

    #[test]
    fn test_counting_sort_layout() {
        let map = VersionMap::build(&sample_table());
        assert_eq!(map.current_version(), 6);
        assert_eq!(map.event_count(), 5);

        assert_eq!(map.events_for(0).unwrap(), &[Event::insert(0)]);
        assert_eq!(map.events_for(1).unwrap(), &[]);
        assert_eq!(map.events_for(2).unwrap(), &[Event::insert(1)]);
        assert_eq!(map.events_for(3).unwrap(), &[Event::insert(2)]);
        assert_eq!(map.events_for(4).unwrap(), &[Event::delete(0)]);
        assert_eq!(map.events_for(5).unwrap(), &[Event::delete(2)]);
    }

    #[test]
    fn test_same_version_insert_precedes_delete_per_row_order() {
        let mut table = TemporalTable::new(3);
        table.push(vec![10], LifeSpan::new(0, 1));
        table.push(vec![20], LifeSpan::new(1, 2));

        let map = VersionMap::build(&table);
        // Version 1 carries row 0's delete and row 1's insert, placed in
        // row order by the stable counting sort.
        assert_eq!(
            map.events_for(1).unwrap(),
            &[Event::delete(0), Event::insert(1)]
        );
    }

    #[test]
    fn test_half_open_range_queries() {
        let map = VersionMap::build(&sample_table());

        let range = map.events_in(0, 3).unwrap();
        assert_eq!(range, &[Event::insert(0), Event::insert(1)]);

        assert!(map.events_in(2, 2).unwrap().is_empty());
        assert_eq!(map.events_in(0, 7).unwrap().len(), 5);
    }

    #[test]
    fn test_out_of_range_versions_are_rejected() {
        let map = VersionMap::build(&sample_table());

        assert!(map.events_for(6).is_ok());
        assert_eq!(
            map.events_for(7),
            Err(TemporaError::InvalidVersion {
                requested: 7,
                current: 6
            })
        );
        assert!(map.events_in(3, 2).is_err());
    }

    #[test]
    fn test_register_version_appends_monotonically() {
        let mut map = VersionMap::empty();
        assert_eq!(map.current_version(), 0);
        assert!(map.events_for(0).unwrap().is_empty());

        map.register_version(&[Event::insert_pair(0, 1), Event::insert_pair(0, 2)]);
        map.register_version(&[]);
        map.register_version(&[Event::delete_pair(0, 1)]);

        assert_eq!(map.current_version(), 3);
        assert_eq!(map.event_count(), 3);
        assert_eq!(map.events_for(0).unwrap().len(), 2);
        assert!(map.events_for(1).unwrap().is_empty());
        assert_eq!(map.events_for(2).unwrap(), &[Event::delete_pair(0, 1)]);
        assert!(map.events_for(3).unwrap().is_empty());
    }

    #[test]
    fn test_empty_table_build_matches_empty() {
        let table = TemporalTable::new(0);
        let map = VersionMap::build(&table);
        assert_eq!(map.current_version(), 0);
        assert_eq!(map.event_count(), 0);
        assert!(map.events_for(0).unwrap().is_empty());
    }
}

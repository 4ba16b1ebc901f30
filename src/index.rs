//! The timeline index.
//!
//! `TimelineIndex` orchestrates the event log, version map, and checkpoint
//! machinery: it builds sparse snapshots at construction, answers
//! point-in-time reconstruction via nearest-checkpoint replay, computes
//! per-version aggregates, and derives new indexes through incremental
//! temporal joins.

use crate::builder::IndexBuilder;
use crate::compute;
use crate::error::{Result, TemporaError};
use crate::rowset::RowSet;
use crate::table::{Row, TemporalTable};
use crate::types::{Config, Event, EventKind, IndexStats, RowId, Version};
use crate::version_map::VersionMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::sync::Arc;

/// Active rows per side for one distinct join-key value; held only while a
/// join is being constructed.
#[derive(Debug, Default)]
struct Intersection {
    rows_a: FxHashSet<RowId>,
    rows_b: FxHashSet<RowId>,
}

/// Temporal index over a versioned table.
///
/// Construction replays the table's event log once, sampling a sparse set
/// of checkpoints along the version axis; queries then reconstruct any
/// version by replaying only the delta from the nearest checkpoint, in
/// either direction.
///
/// # Example
///
/// ```rust
/// use tempora::{LifeSpan, TemporalTable, TimelineIndex};
///
/// let mut table = TemporalTable::new(4);
/// table.push(vec![7], LifeSpan::new(0, 2));
/// table.push(vec![9], LifeSpan::open(1));
///
/// let index = TimelineIndex::new(table);
/// assert_eq!(index.time_travel(1)?, vec![vec![7], vec![9]]);
/// assert_eq!(index.temporal_sum(0)?, vec![7, 16, 9, 9]);
/// # Ok::<(), tempora::TemporaError>(())
/// ```
#[derive(Debug)]
pub struct TimelineIndex {
    table: Arc<TemporalTable>,
    /// Second provenance table for join-result indexes.
    joined: Option<Arc<TemporalTable>>,
    version_map: VersionMap,
    /// `(version, active set at that version)`, ascending, sampled at a
    /// fixed stride. Empty for join-result indexes.
    checkpoints: Vec<(Version, RowSet)>,
    config: Config,
}

impl TimelineIndex {
    /// Build an index over `table` with the default configuration.
    pub fn new(table: impl Into<Arc<TemporalTable>>) -> Self {
        Self::with_config(table, Config::default())
    }

    /// Build an index over `table` with a custom configuration.
    ///
    /// Panics on an invalid configuration; use [`IndexBuilder`] for the
    /// error-typed construction path.
    pub fn with_config(table: impl Into<Arc<TemporalTable>>, config: Config) -> Self {
        if let Err(msg) = config.validate() {
            panic!("invalid configuration: {msg}");
        }

        let table = table.into();
        let version_map = VersionMap::build(&table);
        let checkpoints = Self::sample_checkpoints(&table, &version_map, &config);

        Self {
            table,
            joined: None,
            version_map,
            checkpoints,
            config,
        }
    }

    /// Start a builder for configured construction.
    pub fn builder() -> IndexBuilder {
        IndexBuilder::new()
    }

    /// Replay the whole event log once, snapshotting the running active set
    /// every stride-th version. Strictly sequential: every checkpoint
    /// depends on all earlier events.
    fn sample_checkpoints(
        table: &TemporalTable,
        version_map: &VersionMap,
        config: &Config,
    ) -> Vec<(Version, RowSet)> {
        let next_version = table.next_version();
        if next_version == 0 {
            return Vec::new();
        }

        let stride = (next_version as usize / config.checkpoint_count).max(1) as Version;
        let mut checkpoints = Vec::with_capacity(next_version as usize / stride as usize + 1);
        let mut cursor = RowSet::new(table.len());

        for version in 0..next_version {
            for event in version_map.events_slice(version, version + 1) {
                match event.kind {
                    EventKind::Insert => cursor.insert(event.row),
                    EventKind::Delete => cursor.remove(event.row),
                }
            }
            if version % stride == 0 {
                checkpoints.push((version, cursor.clone()));
            }
        }

        log::debug!(
            "sampled {} checkpoints at stride {} over {} versions",
            checkpoints.len(),
            stride,
            next_version
        );
        checkpoints
    }

    /// Shell for a join result: two provenance tables, no checkpoints, an
    /// empty version map.
    ///
    /// The shell starts covering zero versions; grow it one
    /// [`TimelineIndex::append_version`] call at a time, in strictly
    /// increasing version order. [`TimelineIndex::temporal_join`] builds on
    /// this internally.
    pub fn join_shell(
        a: impl Into<Arc<TemporalTable>>,
        b: impl Into<Arc<TemporalTable>>,
    ) -> Self {
        Self {
            table: a.into(),
            joined: Some(b.into()),
            version_map: VersionMap::empty(),
            checkpoints: Vec::new(),
            config: Config::default(),
        }
    }

    /// Whether this index is the result of a temporal join.
    pub fn is_joined(&self) -> bool {
        self.joined.is_some()
    }

    /// One past the highest version this index can answer queries for.
    pub fn current_version(&self) -> Version {
        self.version_map.current_version()
    }

    /// The table this index was built over.
    pub fn table(&self) -> &TemporalTable {
        &self.table
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            row_count: self.table.len() + self.joined.as_ref().map_or(0, |t| t.len()),
            event_count: self.version_map.event_count(),
            version_count: self.version_map.current_version() as usize,
            checkpoint_count: self.checkpoints.len(),
        }
    }

    pub(crate) fn version_map(&self) -> &VersionMap {
        &self.version_map
    }

    /// Reject columns the table's rows do not have. Empty tables accept any
    /// column: no row is ever projected.
    pub(crate) fn check_column(&self, column: usize) -> Result<()> {
        let width = self.table.width();
        if !self.table.is_empty() && column >= width {
            return Err(TemporaError::InvalidColumn { column, width });
        }
        Ok(())
    }

    /// Worker count for a sharded aggregation over `versions` versions.
    /// Join-result indexes have no checkpoints to seed shards from, so they
    /// always take the sequential path.
    pub(crate) fn effective_shards(&self, versions: usize) -> usize {
        if self.is_joined() {
            return 1;
        }
        self.config.shard_count.min(versions).max(1)
    }

    /// Append one new version's worth of events at the tail of the index.
    ///
    /// Stored checkpoints are left untouched; appended versions are reached
    /// by forward replay from the last one.
    pub fn append_version(&mut self, events: &[Event]) {
        self.version_map.register_version(events);
    }

    /// The checkpoint numerically closest to `version`, on either side.
    fn nearest_checkpoint(&self, version: Version) -> Option<&(Version, RowSet)> {
        let after = self
            .checkpoints
            .partition_point(|(v, _)| *v <= version);

        match (after.checked_sub(1), self.checkpoints.get(after)) {
            (Some(before), Some(next)) => {
                let earlier = &self.checkpoints[before];
                // Replay distance decides; a tie favors the earlier side.
                if version - earlier.0 <= next.0 - version {
                    Some(earlier)
                } else {
                    Some(next)
                }
            }
            (Some(before), None) => Some(&self.checkpoints[before]),
            (None, next) => next,
        }
    }

    /// Reconstruct the active set at `version` from the nearest checkpoint,
    /// replaying the event delta forwards or backwards.
    ///
    /// Caller contract: `version < current_version()` and the index is not
    /// a join result.
    pub(crate) fn active_set_at(&self, version: Version) -> RowSet {
        debug_assert!(version < self.version_map.current_version());
        debug_assert!(!self.is_joined());

        let Some((checkpoint_version, snapshot)) = self.nearest_checkpoint(version) else {
            // No checkpoints: replay everything from an empty baseline.
            let mut set = RowSet::new(self.table.len());
            apply_forward(&mut set, self.version_map.events_slice(0, version + 1));
            return set;
        };

        let mut set = snapshot.clone();
        if *checkpoint_version <= version {
            apply_forward(
                &mut set,
                self.version_map
                    .events_slice(checkpoint_version + 1, version + 1),
            );
        } else {
            apply_backward(
                &mut set,
                self.version_map
                    .events_slice(version + 1, checkpoint_version + 1),
            );
        }
        set
    }

    /// Rows active at exactly `version`.
    ///
    /// For join-result indexes the rows are matched pairs: the left row's
    /// columns followed by the right row's.
    pub fn time_travel(&self, version: Version) -> Result<Vec<Row>> {
        let current = self.version_map.current_version();
        if version >= current {
            return Err(TemporaError::InvalidVersion {
                requested: version,
                current,
            });
        }

        if let Some(joined) = &self.joined {
            return Ok(self.time_travel_pairs(version, joined));
        }

        Ok(self.table.project(&self.active_set_at(version)))
    }

    /// Per-version running sum of `column` over active rows, for all
    /// versions `0..current_version()`.
    pub fn temporal_sum(&self, column: usize) -> Result<Vec<u64>> {
        compute::sum::temporal_sum(self, column)
    }

    /// Per-version running maximum of `column` over active rows; versions
    /// with no active rows yield 0.
    pub fn temporal_max(&self, column: usize) -> Result<Vec<u64>> {
        compute::max::temporal_max(self, column)
    }

    /// Equi-join with `other` on column 0 of both tables.
    pub fn temporal_join(&self, other: &TimelineIndex) -> Result<TimelineIndex> {
        self.temporal_join_on(other, 0)
    }

    /// Equi-join with `other` on `key_column` of both tables.
    ///
    /// Produces a new index whose versions mirror the combined version axis
    /// of the inputs: for every version, rows deactivated on either side
    /// close their pairs before newly activated rows open new ones, so a
    /// pair replaced within one version never yields a spurious event. Each
    /// version's pair-events are registered as exactly one output version,
    /// keeping the axes aligned even when a version changes nothing.
    pub fn temporal_join_on(&self, other: &TimelineIndex, key_column: usize) -> Result<TimelineIndex> {
        if self.is_joined() || other.is_joined() {
            return Err(TemporaError::JoinedIndex);
        }
        self.check_column(key_column)?;
        other.check_column(key_column)?;

        let versions = self
            .current_version()
            .max(other.current_version());
        let mut result =
            Self::join_shell(Arc::clone(&self.table), Arc::clone(other.table_arc()));
        result.config = self.config.clone();

        let mut intersections: FxHashMap<u64, Intersection> = FxHashMap::default();
        let mut pair_events: SmallVec<[Event; 16]> = SmallVec::new();

        for version in 0..versions {
            pair_events.clear();

            let a_events = self.events_at(version);
            let b_events = other.events_at(version);

            // Deletions strictly precede insertions so pairs replaced
            // within one version close before their successors open.
            for event in a_events.iter().filter(|e| e.kind == EventKind::Delete) {
                let key = self.table.value(event.row, key_column);
                if let Some(entry) = intersections.get_mut(&key) {
                    entry.rows_a.remove(&event.row);
                    for &b in &entry.rows_b {
                        pair_events.push(Event::delete_pair(event.row, b));
                    }
                }
            }

            for event in b_events.iter().filter(|e| e.kind == EventKind::Delete) {
                let key = other.table.value(event.row, key_column);
                if let Some(entry) = intersections.get_mut(&key) {
                    entry.rows_b.remove(&event.row);
                    for &a in &entry.rows_a {
                        pair_events.push(Event::delete_pair(a, event.row));
                    }
                }
            }

            for event in a_events.iter().filter(|e| e.kind == EventKind::Insert) {
                let key = self.table.value(event.row, key_column);
                let entry = intersections.entry(key).or_default();
                entry.rows_a.insert(event.row);
                for &b in &entry.rows_b {
                    pair_events.push(Event::insert_pair(event.row, b));
                }
            }

            for event in b_events.iter().filter(|e| e.kind == EventKind::Insert) {
                let key = other.table.value(event.row, key_column);
                let entry = intersections.entry(key).or_default();
                entry.rows_b.insert(event.row);
                for &a in &entry.rows_a {
                    pair_events.push(Event::insert_pair(a, event.row));
                }
            }

            result.version_map.register_version(&pair_events);
        }

        log::debug!(
            "temporal join produced {} events over {} versions",
            result.version_map.event_count(),
            versions
        );
        Ok(result)
    }

    fn table_arc(&self) -> &Arc<TemporalTable> {
        &self.table
    }

    /// Events of `version`, or nothing if this index ends earlier.
    fn events_at(&self, version: Version) -> &[Event] {
        if version < self.version_map.current_version() {
            self.version_map.events_slice(version, version + 1)
        } else {
            &[]
        }
    }

    /// Reconstruct active pairs of a join result at `version`.
    ///
    /// A single-membership row set cannot express one row matching several
    /// partners, so pairs are materialized into a multiplicity map instead.
    fn time_travel_pairs(&self, version: Version, joined: &TemporalTable) -> Vec<Row> {
        let mut active: FxHashMap<(RowId, RowId), u32> = FxHashMap::default();

        for event in self.version_map.events_slice(0, version + 1) {
            let Some(pair_row) = event.pair_row else {
                debug_assert!(false, "join-result event without a pair row");
                continue;
            };
            let pair = (event.row, pair_row);
            match event.kind {
                EventKind::Insert => *active.entry(pair).or_insert(0) += 1,
                EventKind::Delete => match active.get_mut(&pair) {
                    Some(count) if *count > 1 => *count -= 1,
                    Some(_) => {
                        active.remove(&pair);
                    }
                    None => debug_assert!(false, "closed a pair that was never opened"),
                },
            }
        }

        let mut pairs: Vec<(RowId, RowId)> = active.into_keys().collect();
        pairs.sort_unstable();

        pairs
            .into_iter()
            .map(|(a, b)| {
                let mut row = self.table.row(a).to_vec();
                row.extend_from_slice(joined.row(b));
                row
            })
            .collect()
    }
}

fn apply_forward(set: &mut RowSet, events: &[Event]) {
    for event in events {
        match event.kind {
            EventKind::Insert => set.insert(event.row),
            EventKind::Delete => set.remove(event.row),
        }
    }
}

/// Undo `events` newest-first: an insert is taken back out, a delete is
/// put back in.
fn apply_backward(set: &mut RowSet, events: &[Event]) {
    for event in events.iter().rev() {
        match event.kind {
            EventKind::Insert => set.remove(event.row),
            EventKind::Delete => set.insert(event.row),
        }
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
    fn test_time_travel_boundaries() {
        let index = TimelineIndex::new(sample_table());

        assert_eq!(index.time_travel(0).unwrap(), vec![vec![1]]);
        assert_eq!(index.time_travel(2).unwrap(), vec![vec![1], vec![2]]);
        assert_eq!(
            index.time_travel(3).unwrap(),
            vec![vec![1], vec![2], vec![3]]
        );
        assert_eq!(index.time_travel(4).unwrap(), vec![vec![2], vec![3]]);
        assert_eq!(index.time_travel(5).unwrap(), vec![vec![2]]);
    }

    #[test]
    fn test_time_travel_rejects_out_of_range() {
        let index = TimelineIndex::new(sample_table());
        assert_eq!(
            index.time_travel(6),
            Err(TemporaError::InvalidVersion {
                requested: 6,
                current: 6
            })
        );
    }

    #[test]
    fn test_nearest_checkpoint_prefers_shorter_replay() {
        // Stride 2: checkpoints at 0, 2, 4, 6, 8.
        let mut table = TemporalTable::new(10);
        for i in 0..10 {
            table.push(vec![i as u64], LifeSpan::open(i));
        }
        let index = TimelineIndex::with_config(
            table,
            Config::default().with_checkpoint_count(5),
        );

        let (v, _) = index.nearest_checkpoint(3).unwrap();
        assert_eq!(*v, 2, "tie between 2 and 4 favors the earlier");

        let (v, _) = index.nearest_checkpoint(5).unwrap();
        assert_eq!(*v, 4);

        let (v, _) = index.nearest_checkpoint(9).unwrap();
        assert_eq!(*v, 8);
    }

    #[test]
    fn test_backward_replay_matches_forward() {
        let mut table = TemporalTable::new(100);
        for i in 0..50u32 {
            table.push(vec![i as u64], LifeSpan::new(i, i + 50));
        }
        // A single checkpoint region boundary forces both directions.
        let coarse = TimelineIndex::with_config(
            table.clone(),
            Config::default().with_checkpoint_count(2),
        );
        let fine = TimelineIndex::with_config(
            table,
            Config::default().with_checkpoint_count(100),
        );

        for version in 0..100 {
            assert_eq!(
                coarse.time_travel(version).unwrap(),
                fine.time_travel(version).unwrap(),
                "version {version}"
            );
        }
    }

    #[test]
    fn test_append_version_extends_the_axis() {
        let mut index = TimelineIndex::new(sample_table());
        assert_eq!(index.current_version(), 6);

        index.append_version(&[Event::delete(1)]);
        assert_eq!(index.current_version(), 7);
        assert_eq!(index.time_travel(6).unwrap(), Vec::<Row>::new());
    }

    #[test]
    fn test_stats() {
        let index = TimelineIndex::new(sample_table());
        let stats = index.stats();
        assert_eq!(stats.row_count, 3);
        assert_eq!(stats.event_count, 5);
        assert_eq!(stats.version_count, 6);
        assert!(stats.checkpoint_count > 0);
    }

    #[test]
    fn test_join_on_joined_index_is_rejected() {
        let a = TimelineIndex::new(sample_table());
        let b = TimelineIndex::new(sample_table());
        let joined = a.temporal_join(&b).unwrap();
        assert_eq!(
            joined.temporal_join(&a).unwrap_err(),
            TemporaError::JoinedIndex
        );
    }
}

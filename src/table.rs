//! The versioned table the index is built over.
//!
//! `TemporalTable` is a deliberately plain collaborator: an ordered list of
//! fixed-width numeric rows, each carrying the lifespan of versions during
//! which it is active. The index only consumes row counts, lifespans, and
//! projection; the brute-force query methods on the table exist as the
//! ground truth the index is checked against.

use crate::rowset::RowSet;
use crate::types::{LifeSpan, RowId, Version};

/// One logical record: an ordered list of numeric column values.
pub type Row = Vec<u64>;

/// Read-only provider of rows and lifespan metadata.
#[derive(Debug, Clone, Default)]
pub struct TemporalTable {
    rows: Vec<(Row, LifeSpan)>,
    next_version: Version,
}

impl TemporalTable {
    /// An empty table whose version counter stands at `next_version`.
    pub fn new(next_version: Version) -> Self {
        Self {
            rows: Vec::new(),
            next_version,
        }
    }

    /// Append a row with its lifespan.
    ///
    /// Rows must share one fixed column width, lifespans must start before
    /// they end, and no event may lie beyond `next_version`.
    pub fn push(&mut self, row: Row, lifespan: LifeSpan) {
        if let Some((first, _)) = self.rows.first() {
            assert_eq!(first.len(), row.len(), "rows must share one column width");
        }
        if let Some(end) = lifespan.end {
            assert!(lifespan.start < end, "lifespan must end after it starts");
            assert!(end <= self.next_version, "lifespan ends beyond next_version");
        }
        assert!(
            lifespan.start < self.next_version,
            "lifespan starts beyond next_version"
        );
        self.rows.push((row, lifespan));
    }

    /// Number of rows ever recorded, active or not.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns per row; 0 for an empty table.
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, |(row, _)| row.len())
    }

    /// One past the highest version any event can carry.
    pub fn next_version(&self) -> Version {
        self.next_version
    }

    /// Total number of events the rows contribute: two per closed lifespan,
    /// one per open lifespan.
    pub fn event_count(&self) -> usize {
        self.rows
            .iter()
            .map(|(_, lifespan)| lifespan.event_count())
            .sum()
    }

    /// Column values of one row.
    pub fn row(&self, id: RowId) -> &[u64] {
        &self.rows[id as usize].0
    }

    /// Lifespan of one row.
    pub fn lifespan(&self, id: RowId) -> LifeSpan {
        self.rows[id as usize].1
    }

    /// Single column value of one row.
    pub fn value(&self, id: RowId, column: usize) -> u64 {
        self.rows[id as usize].0[column]
    }

    /// Iterate `(row id, lifespan)` pairs in row order.
    pub fn lifespans(&self) -> impl Iterator<Item = (RowId, LifeSpan)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .map(|(id, (_, lifespan))| (id as RowId, *lifespan))
    }

    /// Materialize the rows named by `set`, in ascending row order.
    pub fn project(&self, set: &RowSet) -> Vec<Row> {
        let mut result = Vec::with_capacity(set.len());
        for id in set {
            result.push(self.rows[id as usize].0.clone());
        }
        result
    }

    /// Brute-force reconstruction: every row whose lifespan contains
    /// `version`, scanned directly from the table.
    pub fn time_travel(&self, version: Version) -> Vec<Row> {
        self.rows
            .iter()
            .filter(|(_, lifespan)| lifespan.contains(version))
            .map(|(row, _)| row.clone())
            .collect()
    }

    /// Brute-force per-version running sum of `column` over active rows.
    pub fn temporal_sum(&self, column: usize) -> Vec<u64> {
        (0..self.next_version)
            .map(|version| {
                self.rows
                    .iter()
                    .filter(|(_, lifespan)| lifespan.contains(version))
                    .map(|(row, _)| row[column])
                    .fold(0u64, u64::wrapping_add)
            })
            .collect()
    }

    /// Brute-force per-version running maximum of `column` over active
    /// rows; versions with no active rows yield 0.
    pub fn temporal_max(&self, column: usize) -> Vec<u64> {
        (0..self.next_version)
            .map(|version| {
                self.rows
                    .iter()
                    .filter(|(_, lifespan)| lifespan.contains(version))
                    .map(|(row, _)| row[column])
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

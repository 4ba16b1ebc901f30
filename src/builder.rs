//! Index builder for flexible configuration
//!
//! This module provides a builder pattern for constructing timeline
//! indexes with custom tuning parameters.

use crate::error::{Result, TemporaError};
use crate::index::TimelineIndex;
use crate::table::TemporalTable;
use crate::types::Config;
use std::sync::Arc;

/// Builder for index construction with custom tuning parameters.
///
/// # Example
///
/// ```rust
/// use tempora::{IndexBuilder, LifeSpan, TemporalTable};
///
/// let mut table = TemporalTable::new(3);
/// table.push(vec![5], LifeSpan::open(0));
///
/// let index = IndexBuilder::new()
///     .checkpoint_count(10)
///     .shard_count(2)
///     .build(table)?;
/// assert_eq!(index.current_version(), 3);
/// # Ok::<(), tempora::TemporaError>(())
/// ```
#[derive(Debug, Default)]
pub struct IndexBuilder {
    config: Config,
}

impl IndexBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Number of checkpoints sampled along the version axis.
    pub fn checkpoint_count(mut self, count: usize) -> Self {
        self.config.checkpoint_count = count;
        self
    }

    /// Number of worker threads for the parallel aggregation variants.
    pub fn shard_count(mut self, count: usize) -> Self {
        self.config.shard_count = count;
        self
    }

    /// Capacity of the bounded top set maintained by `temporal_max`.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Replace the whole configuration at once.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Build the index over `table`, validating the configuration first.
    pub fn build(self, table: impl Into<Arc<TemporalTable>>) -> Result<TimelineIndex> {
        self.config
            .validate()
            .map_err(TemporaError::InvalidConfig)?;
        Ok(TimelineIndex::with_config(table, self.config))
    }
}

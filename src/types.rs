//! Core types and configuration for tempora.
//!
//! This module provides the value types shared by the index machinery and a
//! serializable configuration with minimal complexity.

use serde::de::Error;
use serde::{Deserialize, Serialize};

/// Discrete logical timestamp; a monotonically increasing change counter.
pub type Version = u32;

/// Index into the backing table's row list; stable for a row's lifetime.
pub type RowId = u32;

/// The version interval `[start, end)` during which a row is active.
///
/// `end == None` means the row is active through the latest known version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeSpan {
    pub start: Version,
    pub end: Option<Version>,
}

impl LifeSpan {
    /// A lifespan covering `[start, end)`.
    pub fn new(start: Version, end: Version) -> Self {
        assert!(start < end, "lifespan must end after it starts");
        Self {
            start,
            end: Some(end),
        }
    }

    /// A lifespan open on the right: active from `start` onwards.
    pub fn open(start: Version) -> Self {
        Self { start, end: None }
    }

    /// Whether the row is active at `version`.
    pub fn contains(&self, version: Version) -> bool {
        self.start <= version && self.end.is_none_or(|end| end > version)
    }

    /// Number of events this lifespan contributes to the log.
    pub fn event_count(&self) -> usize {
        if self.end.is_some() { 2 } else { 1 }
    }
}

/// Activation or deactivation transition for a row at some version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Insert,
    Delete,
}

/// One transition in the event log.
///
/// `pair_row` is populated only for pair-events synthesized by a temporal
/// join, where an event represents the (de)activation of a matched
/// `(row, pair_row)` combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub row: RowId,
    pub pair_row: Option<RowId>,
    pub kind: EventKind,
}

impl Event {
    pub fn insert(row: RowId) -> Self {
        Self {
            row,
            pair_row: None,
            kind: EventKind::Insert,
        }
    }

    pub fn delete(row: RowId) -> Self {
        Self {
            row,
            pair_row: None,
            kind: EventKind::Delete,
        }
    }

    pub fn insert_pair(row: RowId, pair_row: RowId) -> Self {
        Self {
            row,
            pair_row: Some(pair_row),
            kind: EventKind::Insert,
        }
    }

    pub fn delete_pair(row: RowId, pair_row: RowId) -> Self {
        Self {
            row,
            pair_row: Some(pair_row),
            kind: EventKind::Delete,
        }
    }
}

/// Tunable parameters for index construction and queries.
///
/// The configuration is designed to be easily serializable and loadable
/// from JSON, TOML, or other formats.
///
/// # Example
///
/// ```rust
/// use tempora::Config;
///
/// // Create default config
/// let config = Config::default();
///
/// // Load from JSON
/// let json = r#"{
///     "checkpoint_count": 100,
///     "shard_count": 4,
///     "top_k": 50
/// }"#;
/// let config: Config = Config::from_json(json).unwrap();
/// assert_eq!(config.checkpoint_count, 100);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of checkpoints sampled along the version axis during
    /// construction. More checkpoints mean shorter replay distances per
    /// query at the cost of memory.
    #[serde(default = "Config::default_checkpoint_count")]
    pub checkpoint_count: usize,

    /// Number of worker threads used by the parallel aggregation variants.
    /// A value of 1 forces the sequential path.
    #[serde(default = "Config::default_shard_count")]
    pub shard_count: usize,

    /// Capacity of the bounded top set maintained by `temporal_max`.
    #[serde(default = "Config::default_top_k")]
    pub top_k: usize,
}

impl Config {
    const fn default_checkpoint_count() -> usize {
        50
    }

    const fn default_shard_count() -> usize {
        8
    }

    const fn default_top_k() -> usize {
        100
    }

    pub fn with_checkpoint_count(mut self, count: usize) -> Self {
        assert!(count > 0, "Checkpoint count must be greater than zero");
        self.checkpoint_count = count;
        self
    }

    pub fn with_shard_count(mut self, count: usize) -> Self {
        assert!(count > 0, "Shard count must be greater than zero");
        self.shard_count = count;
        self
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        assert!(k > 0, "Top-K capacity must be greater than zero");
        self.top_k = k;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.checkpoint_count == 0 {
            return Err("Checkpoint count must be greater than zero".to_string());
        }

        if self.shard_count == 0 {
            return Err("Shard count must be greater than zero".to_string());
        }

        if self.top_k == 0 {
            return Err("Top-K capacity must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            checkpoint_count: Self::default_checkpoint_count(),
            shard_count: Self::default_shard_count(),
            top_k: Self::default_top_k(),
        }
    }
}

/// Index statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of rows in the backing table
    pub row_count: usize,
    /// Number of events in the log
    pub event_count: usize,
    /// Number of versions covered by the index
    pub version_count: usize,
    /// Number of stored checkpoints
    pub checkpoint_count: usize,
}

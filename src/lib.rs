//! Embedded temporal indexing engine with time-travel, incremental
//! aggregates, and temporal joins.
//!
//! A [`TemporalTable`] records rows together with the version interval
//! during which each row is active. A [`TimelineIndex`] built over such a
//! table answers "what did the table look like at version v" from sparse
//! checkpoints plus bidirectional event replay, computes per-version
//! running sums and maxima incrementally, and derives new indexes through
//! incremental equi-joins — all without rescanning the table per query.
//!
//! ```rust
//! use tempora::{LifeSpan, TemporalTable, TimelineIndex};
//!
//! let mut table = TemporalTable::new(4);
//! table.push(vec![7], LifeSpan::new(0, 2));
//! table.push(vec![9], LifeSpan::open(1));
//!
//! let index = TimelineIndex::new(table);
//! assert_eq!(index.time_travel(1)?.len(), 2);
//! assert_eq!(index.temporal_sum(0)?, vec![7, 16, 9, 9]);
//! assert_eq!(index.temporal_max(0)?, vec![7, 9, 9, 9]);
//! # Ok::<(), tempora::TemporaError>(())
//! ```

pub mod builder;
pub(crate) mod compute;
pub mod error;
pub mod event_log;
pub mod index;
pub mod rowset;
pub mod table;
pub mod types;
pub mod version_map;

#[cfg(feature = "sync")]
pub mod sync;

pub use builder::IndexBuilder;
pub use error::{Result, TemporaError};
pub use index::TimelineIndex;

pub type Tempora = TimelineIndex;

pub use event_log::EventLog;
pub use rowset::RowSet;
pub use table::{Row, TemporalTable};
pub use types::{Config, Event, EventKind, IndexStats, LifeSpan, RowId, Version};
pub use version_map::VersionMap;

#[cfg(feature = "sync")]
pub use sync::SyncTimeline;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{IndexBuilder, Result, Tempora, TemporaError, TimelineIndex};

    pub use crate::{Row, TemporalTable};

    pub use crate::{Config, Event, EventKind, LifeSpan, RowId, Version};

    #[cfg(feature = "sync")]
    pub use crate::SyncTimeline;
}

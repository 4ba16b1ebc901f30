//! Per-version running sum.
//!
//! The sequential core is an exact incremental prefix aggregation: one
//! running scalar, updated by every event, recorded once per version. The
//! parallel variant shards the version axis; each shard reconstructs an
//! absolute baseline at its start version via checkpoint replay and then
//! proceeds incrementally, writing into its own disjoint slice of the
//! output buffer. The scope join is the only synchronization point.

use crate::error::Result;
use crate::index::TimelineIndex;
use crate::types::{EventKind, Version};

pub(crate) fn temporal_sum(index: &TimelineIndex, column: usize) -> Result<Vec<u64>> {
    index.check_column(column)?;

    let versions = index.current_version() as usize;
    if versions == 0 {
        return Ok(Vec::new());
    }

    let shards = index.effective_shards(versions);
    let mut result = vec![0u64; versions];

    if shards <= 1 {
        run_range(index, column, 0, 0, &mut result);
        return Ok(result);
    }

    let chunk = versions.div_ceil(shards);
    log::debug!("temporal_sum over {versions} versions in {shards} shards");

    std::thread::scope(|scope| {
        for (i, slots) in result.chunks_mut(chunk).enumerate() {
            scope.spawn(move || {
                let start = (i * chunk) as Version;
                let seed = baseline_sum(index, column, start);
                run_range(index, column, start, seed, slots);
            });
        }
    });

    Ok(result)
}

/// Sum of `column` over the rows active just before `start`.
fn baseline_sum(index: &TimelineIndex, column: usize, start: Version) -> u64 {
    if start == 0 {
        return 0;
    }
    let active = index.active_set_at(start - 1);
    active
        .iter()
        .map(|id| index.table().value(id, column))
        .fold(0u64, u64::wrapping_add)
}

/// Replay versions `start..start + slots.len()`, recording the running sum
/// after each version's events.
fn run_range(index: &TimelineIndex, column: usize, start: Version, seed: u64, slots: &mut [u64]) {
    let mut sum = seed;
    for (offset, slot) in slots.iter_mut().enumerate() {
        let version = start + offset as Version;
        for event in index.version_map().events_slice(version, version + 1) {
            let value = index.table().value(event.row, column);
            match event.kind {
                EventKind::Insert => sum = sum.wrapping_add(value),
                EventKind::Delete => sum = sum.wrapping_sub(value),
            }
        }
        *slot = sum;
    }
}

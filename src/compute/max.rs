//! Per-version running maximum with bounded top-K maintenance.
//!
//! Tracking only the single maximum would make deletions expensive, and
//! tracking every active value would waste memory. The middle ground is a
//! bounded sorted multiset of the K largest active values plus an overflow
//! multiplicity map for everything pushed out. Steady-state operations cost
//! O(log K); the one pass that scales with the overflow size is the refill
//! after the top set empties, which only happens when K deletions land in a
//! row.
//!
//! Invariant: whenever the top set is non-empty, every overflow value is at
//! most the top set's minimum, so the top set's maximum is the global one.

use crate::error::Result;
use crate::index::TimelineIndex;
use crate::types::{EventKind, Version};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Bounded multiset of the K largest active values with overflow tracking.
#[derive(Debug)]
pub(crate) struct TopK {
    k: usize,
    /// value -> multiplicity, ordered; cheap min/max lookup.
    set: BTreeMap<u64, u32>,
    set_len: usize,
    /// Active values currently excluded by K larger members.
    overflow: FxHashMap<u64, u32>,
    /// One-way flag: once the set has reached K members, small inserts go
    /// to overflow even if deletions later shrink the set.
    filled: bool,
}

impl TopK {
    pub(crate) fn new(k: usize) -> Self {
        Self {
            k,
            set: BTreeMap::new(),
            set_len: 0,
            overflow: FxHashMap::default(),
            filled: false,
        }
    }

    /// Bootstrap from a snapshot of all currently active values.
    pub(crate) fn seeded(k: usize, mut values: Vec<u64>) -> Self {
        values.sort_unstable_by(|a, b| b.cmp(a));

        let mut topk = Self::new(k);
        for value in values.drain(..) {
            if topk.set_len < k {
                topk.set_push(value);
            } else {
                *topk.overflow.entry(value).or_insert(0) += 1;
            }
        }
        topk.filled = topk.set_len >= k;
        topk
    }

    /// Current maximum, or 0 when nothing is active.
    pub(crate) fn max(&self) -> u64 {
        self.set.keys().next_back().copied().unwrap_or(0)
    }

    pub(crate) fn insert(&mut self, value: u64) {
        if !self.filled || self.set_len == 0 {
            self.set_push(value);
            if self.set_len >= self.k {
                self.filled = true;
            }
            return;
        }

        let min = self.set_min();
        if value > min {
            if self.set_len >= self.k {
                self.set_pull(min);
                *self.overflow.entry(min).or_insert(0) += 1;
            }
            self.set_push(value);
        } else {
            *self.overflow.entry(value).or_insert(0) += 1;
        }
    }

    pub(crate) fn remove(&mut self, value: u64) {
        if self.set_len > 0 && value >= self.set_min() {
            self.set_pull(value);
            if self.set_len == 0 {
                self.refill();
            }
        } else {
            match self.overflow.get_mut(&value) {
                Some(count) => {
                    *count -= 1;
                    if *count == 0 {
                        self.overflow.remove(&value);
                    }
                }
                None => debug_assert!(false, "removed value {value} was never tracked"),
            }
        }
    }

    /// Rebuild the top set from overflow after it ran empty, pulling values
    /// in descending order until K members or overflow exhaustion. The only
    /// operation whose cost scales with the overflow size.
    fn refill(&mut self) {
        if self.overflow.is_empty() {
            return;
        }

        let mut values: Vec<u64> = self.overflow.keys().copied().collect();
        values.sort_unstable_by(|a, b| b.cmp(a));

        for value in values {
            let available = self.overflow[&value] as usize;
            let wanted = (self.k - self.set_len).min(available);

            *self.set.entry(value).or_insert(0) += wanted as u32;
            self.set_len += wanted;

            if wanted == available {
                self.overflow.remove(&value);
            } else if let Some(count) = self.overflow.get_mut(&value) {
                *count -= wanted as u32;
            }

            if self.set_len == self.k {
                break;
            }
        }
    }

    fn set_min(&self) -> u64 {
        debug_assert!(self.set_len > 0);
        self.set.keys().next().copied().unwrap_or(0)
    }

    fn set_push(&mut self, value: u64) {
        *self.set.entry(value).or_insert(0) += 1;
        self.set_len += 1;
    }

    fn set_pull(&mut self, value: u64) {
        match self.set.get_mut(&value) {
            Some(count) => {
                *count -= 1;
                if *count == 0 {
                    self.set.remove(&value);
                }
                self.set_len -= 1;
            }
            None => debug_assert!(false, "value {value} missing from top set"),
        }
    }
}

pub(crate) fn temporal_max(index: &TimelineIndex, column: usize) -> Result<Vec<u64>> {
    index.check_column(column)?;

    let versions = index.current_version() as usize;
    if versions == 0 {
        return Ok(Vec::new());
    }

    let k = index.config().top_k;
    let shards = index.effective_shards(versions);
    let mut result = vec![0u64; versions];

    if shards <= 1 {
        run_range(index, column, 0, TopK::new(k), &mut result);
        return Ok(result);
    }

    let chunk = versions.div_ceil(shards);
    log::debug!("temporal_max over {versions} versions in {shards} shards");

    std::thread::scope(|scope| {
        for (i, slots) in result.chunks_mut(chunk).enumerate() {
            scope.spawn(move || {
                let start = (i * chunk) as Version;
                let topk = baseline_topk(index, column, start, k);
                run_range(index, column, start, topk, slots);
            });
        }
    });

    Ok(result)
}

/// Bootstrap a shard's top-K state from the active set just before `start`.
fn baseline_topk(index: &TimelineIndex, column: usize, start: Version, k: usize) -> TopK {
    if start == 0 {
        return TopK::new(k);
    }
    let active = index.active_set_at(start - 1);
    let values: Vec<u64> = active
        .iter()
        .map(|id| index.table().value(id, column))
        .collect();
    TopK::seeded(k, values)
}

/// Replay versions `start..start + slots.len()`, recording the running
/// maximum after each version's events.
fn run_range(
    index: &TimelineIndex,
    column: usize,
    start: Version,
    mut topk: TopK,
    slots: &mut [u64],
) {
    for (offset, slot) in slots.iter_mut().enumerate() {
        let version = start + offset as Version;
        for event in index.version_map().events_slice(version, version + 1) {
            let value = index.table().value(event.row, column);
            match event.kind {
                EventKind::Insert => topk.insert(value),
                EventKind::Delete => topk.remove(value),
            }
        }
        *slot = topk.max();
    }
}

//! Counters observing what a checkpoint strategy has done.

use core::fmt;

/// Monotone counters recording the work performed through a strategy.
///
/// All counters only ever increase (until [`reset`](CheckpointMetrics::reset)
/// is called explicitly). Recomputation is a normal, counted code path of the
/// reverse sweep, not an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CheckpointMetrics {
    /// Number of accepted `add_checkpoint_and_get_index_to_remove` calls.
    pub stores: u64,

    /// Number of slots evicted to make room for a newer checkpoint.
    pub evictions: u64,

    /// Number of forward iterations replayed during reverse sweeps.
    pub recomputations: u64,
}

impl CheckpointMetrics {
    /// Clears all counters back to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for CheckpointMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stores={} evictions={} recomputations={}",
            self.stores, self.evictions, self.recomputations
        )
    }
}

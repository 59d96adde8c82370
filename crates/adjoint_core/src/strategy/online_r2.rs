//! Uniform-spacing online checkpointing (Stumm & Walther, "Online r=2").
//!
//! Reference: Philipp Stumm and Andrea Walther, "New Algorithms for Optimal
//! Online Checkpointing", SIAM J. Sci. Comput., 32(2), 836-854, 2010.

use core::fmt;

use crate::error::CheckpointError;
use crate::metrics::CheckpointMetrics;
use crate::strategy::{
    write_diagnostic, CheckpointStrategy, StepIndex, INVALID_CHECKPOINT_INDEX,
};

/// A checkpoint slot: step plus persistence flag.
#[derive(Clone, Copy, Debug)]
struct Slot {
    step: StepIndex,
    persistent: bool,
}

/// Online checkpoint placement with approximately uniform spacing.
///
/// No level concept. When at capacity, the eviction candidate is the
/// non-persistent slot whose removal produces the smallest *merged gap*
/// between its neighbors, which preferentially thins dense clusters and
/// keeps the retained steps spread out over the whole history. The step
/// being added acts as the virtual right boundary of the rightmost slot, so
/// the most recent checkpoint is never trivially evicted.
///
/// Works online: the total number of steps need not be known in advance.
/// After a forward sweep of `N` steps with budget `C`, consecutive retained
/// steps are at most about `2N/C` apart.
#[derive(Clone, Debug)]
pub struct OnlineR2CheckpointStrategy {
    /// Effective capacity, including persistent grants.
    max_num_slots: usize,

    /// Slots sorted by step.
    slots: Vec<Slot>,

    metrics: CheckpointMetrics,
}

impl OnlineR2CheckpointStrategy {
    /// Creates an empty strategy with `max_states` non-persistent slots.
    pub fn new(max_states: usize) -> Self {
        Self {
            max_num_slots: max_states,
            slots: Vec::with_capacity(max_states),
            metrics: CheckpointMetrics::default(),
        }
    }

    /// Index of the best eviction candidate for an incoming `new_step`.
    ///
    /// Scans the non-persistent slots for the one whose removal merges its
    /// neighboring gaps into the smallest combined span. `new_step` serves
    /// as the right boundary of the last slot; the left boundary of the
    /// first slot is step 0. Equal gaps keep the incumbent, so the earliest
    /// minimal candidate wins. `None` when every slot is persistent.
    fn find_eviction_candidate(&self, new_step: StepIndex) -> Option<usize> {
        let mut best_idx = None;
        let mut best_merged_gap = StepIndex::MAX;

        for (idx, slot) in self.slots.iter().enumerate() {
            if slot.persistent {
                continue;
            }

            let left_step = if idx > 0 { self.slots[idx - 1].step } else { 0 };
            let right_step = if idx + 1 < self.slots.len() {
                self.slots[idx + 1].step
            } else {
                // The virtual boundary cannot precede the slot itself, which
                // matters when a step is inserted out of order.
                new_step.max(slot.step)
            };

            let merged_gap = right_step - left_step;
            if merged_gap < best_merged_gap {
                best_merged_gap = merged_gap;
                best_idx = Some(idx);
            }
        }

        best_idx
    }
}

impl CheckpointStrategy for OnlineR2CheckpointStrategy {
    fn name(&self) -> &'static str {
        "OnlineR2"
    }

    fn add_checkpoint_and_get_index_to_remove(
        &mut self,
        step: StepIndex,
        persistent: bool,
    ) -> Result<StepIndex, CheckpointError> {
        let mut insert_at = match self.slots.binary_search_by_key(&step, |s| s.step) {
            Ok(_) => return Err(CheckpointError::DuplicateStep { step }),
            Err(pos) => pos,
        };

        let mut next_erase_step = INVALID_CHECKPOINT_INDEX;

        if persistent {
            self.max_num_slots += 1;
        }

        if self.slots.len() < self.max_num_slots {
            self.slots.insert(insert_at, Slot { step, persistent });
        } else if let Some(evict_idx) = self.find_eviction_candidate(step) {
            next_erase_step = self.slots[evict_idx].step;
            self.slots.remove(evict_idx);
            if evict_idx < insert_at {
                insert_at -= 1;
            }
            self.slots.insert(insert_at, Slot { step, persistent });
        }
        // With every slot persistent the new step is dropped; unreachable
        // for a budget of at least one non-persistent slot.

        self.metrics.stores += 1;
        if next_erase_step != INVALID_CHECKPOINT_INDEX {
            self.metrics.evictions += 1;
        }

        Ok(next_erase_step)
    }

    fn last_checkpoint_step(&self) -> Result<StepIndex, CheckpointError> {
        self.slots
            .last()
            .map(|slot| slot.step)
            .ok_or(CheckpointError::Empty)
    }

    fn erase_step(&mut self, step: StepIndex) -> bool {
        match self.slots.binary_search_by_key(&step, |s| s.step) {
            Ok(idx) if !self.slots[idx].persistent => {
                self.slots.remove(idx);
                true
            }
            _ => false,
        }
    }

    fn contains_step(&self, step: StepIndex) -> bool {
        self.slots.binary_search_by_key(&step, |s| s.step).is_ok()
    }

    fn reset(&mut self) {
        self.slots.retain(|slot| slot.persistent);
    }

    fn capacity(&self) -> usize {
        self.max_num_slots
    }

    fn size(&self) -> usize {
        self.slots.len()
    }

    fn checkpoint_steps(&self) -> Vec<StepIndex> {
        self.slots.iter().map(|slot| slot.step).collect()
    }

    fn record_recomputation(&mut self) {
        self.metrics.recomputations += 1;
    }

    fn metrics(&self) -> CheckpointMetrics {
        self.metrics
    }

    fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write_diagnostic(
            out,
            self.name(),
            self.max_num_slots,
            self.slots.iter().map(|slot| (slot.step, slot.persistent)),
        )
    }
}

impl fmt::Display for OnlineR2CheckpointStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print(f)
    }
}

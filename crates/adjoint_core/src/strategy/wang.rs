//! Level-based online checkpointing.

use core::fmt;

use crate::error::CheckpointError;
use crate::metrics::CheckpointMetrics;
use crate::strategy::{
    write_diagnostic, CheckpointStrategy, StepIndex, INVALID_CHECKPOINT_INDEX,
};

/// A checkpoint slot carrying its dispensability level.
#[derive(Clone, Copy, Debug)]
struct Slot {
    step: StepIndex,
    level: u32,
    persistent: bool,
}

/// Level-based online checkpoint placement.
///
/// Each non-persistent slot carries an integer *level*: the level of step
/// `s` is the largest `l` such that `base^l` divides `s`, where `base` is
/// the constructed slot budget (clamped to at least 2). Level-`l`
/// checkpoints are therefore spaced `base^l` steps apart, so higher-level
/// checkpoints survive longer and cover wider spans of the history.
///
/// Eviction takes the *dispensable* slot: the non-persistent slot of lowest
/// level, tie-broken toward the smallest step. During a reverse sweep the
/// freed capacity lets replays re-checkpoint each span at the next lower
/// level, which bounds the number of times any single step is recomputed by
/// the number of levels, and that is logarithmic in the realized step count
/// for a fixed budget.
///
/// The total step count need not be known in advance.
#[derive(Clone, Debug)]
pub struct WangCheckpointStrategy {
    /// Effective capacity, including persistent grants.
    max_num_slots: usize,

    /// Base of the level spacing, the constructed budget clamped to >= 2.
    level_base: usize,

    /// Slots sorted by step.
    slots: Vec<Slot>,

    metrics: CheckpointMetrics,
}

impl WangCheckpointStrategy {
    /// Creates an empty strategy with `max_states` non-persistent slots.
    pub fn new(max_states: usize) -> Self {
        Self {
            max_num_slots: max_states,
            level_base: max_states.max(2),
            slots: Vec::with_capacity(max_states),
            metrics: CheckpointMetrics::default(),
        }
    }

    /// Dispensability level of a step: the largest `l` with `base^l | step`.
    fn checkpoint_level(&self, step: StepIndex) -> u32 {
        if step == 0 {
            return u32::MAX;
        }
        let mut level = 0;
        let mut span = self.level_base;
        while step % span == 0 {
            level += 1;
            span = match span.checked_mul(self.level_base) {
                Some(next) => next,
                None => break,
            };
        }
        level
    }

    /// Index of the dispensable slot: lowest level, smallest step on ties.
    /// `None` when every slot is persistent.
    fn find_dispensable(&self) -> Option<usize> {
        let mut best: Option<(u32, usize)> = None;
        for (idx, slot) in self.slots.iter().enumerate() {
            if slot.persistent {
                continue;
            }
            // Strict comparison keeps the earliest slot on equal levels.
            if best.map_or(true, |(level, _)| slot.level < level) {
                best = Some((slot.level, idx));
            }
        }
        best.map(|(_, idx)| idx)
    }
}

impl CheckpointStrategy for WangCheckpointStrategy {
    fn name(&self) -> &'static str {
        "Wang"
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
            self.slots.insert(
                insert_at,
                Slot {
                    step,
                    level: u32::MAX,
                    persistent: true,
                },
            );
        } else {
            let level = self.checkpoint_level(step);
            if self.slots.len() >= self.max_num_slots {
                let evict_idx =
                    self.find_dispensable()
                        .ok_or(CheckpointError::NoEvictableSlot {
                            capacity: self.max_num_slots,
                        })?;
                next_erase_step = self.slots[evict_idx].step;
                self.slots.remove(evict_idx);
                if evict_idx < insert_at {
                    insert_at -= 1;
                }
            }
            self.slots.insert(
                insert_at,
                Slot {
                    step,
                    level,
                    persistent: false,
                },
            );
        }

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

impl fmt::Display for WangCheckpointStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::valid_checkpoint_index;

    // ========================================================================
    // Level Assignment Tests
    // ========================================================================

    #[test]
    fn test_checkpoint_level_base_three() {
        let strategy = WangCheckpointStrategy::new(3);
        assert_eq!(strategy.checkpoint_level(1), 0);
        assert_eq!(strategy.checkpoint_level(2), 0);
        assert_eq!(strategy.checkpoint_level(3), 1);
        assert_eq!(strategy.checkpoint_level(6), 1);
        assert_eq!(strategy.checkpoint_level(9), 2);
        assert_eq!(strategy.checkpoint_level(27), 3);
        assert_eq!(strategy.checkpoint_level(0), u32::MAX);
    }

    #[test]
    fn test_level_base_clamped_for_tiny_budgets() {
        // A budget of 0 or 1 still needs a meaningful spacing base.
        assert_eq!(WangCheckpointStrategy::new(0).level_base, 2);
        assert_eq!(WangCheckpointStrategy::new(1).level_base, 2);
        assert_eq!(WangCheckpointStrategy::new(5).level_base, 5);
    }

    // ========================================================================
    // Placement Tests
    // ========================================================================

    #[test]
    fn test_no_eviction_below_capacity() {
        let mut strategy = WangCheckpointStrategy::new(4);
        for step in 1..=4 {
            let evicted = strategy
                .add_checkpoint_and_get_index_to_remove(step, false)
                .unwrap();
            assert!(!valid_checkpoint_index(evicted));
        }
        assert_eq!(strategy.size(), 4);
        assert_eq!(strategy.metrics().evictions, 0);
    }

    #[test]
    fn test_eviction_takes_lowest_level_oldest_first() {
        // Budget 3 plus a persistent initial condition; levels in base 3.
        let mut strategy = WangCheckpointStrategy::new(3);
        strategy.add_checkpoint_and_get_index_to_remove(0, true).unwrap();

        let mut evictions = Vec::new();
        for step in 1..=10 {
            let evicted = strategy
                .add_checkpoint_and_get_index_to_remove(step, false)
                .unwrap();
            if valid_checkpoint_index(evicted) {
                evictions.push(evicted);
            }
        }

        // Steps 1..=3 fill the free slots; from step 4 on, the lowest-level
        // (oldest on ties) slot goes: 1, 2, then 4 once level-1 step 3 is
        // worth more, and so on.
        assert_eq!(evictions, vec![1, 2, 4, 5, 7, 8, 3]);
        assert_eq!(strategy.checkpoint_steps(), vec![0, 6, 9, 10]);
        assert_eq!(strategy.last_checkpoint_step().unwrap(), 10);
    }

    #[test]
    fn test_higher_levels_survive_longer() {
        let mut strategy = WangCheckpointStrategy::new(4);
        strategy.add_checkpoint_and_get_index_to_remove(0, true).unwrap();
        for step in 1..=64 {
            strategy
                .add_checkpoint_and_get_index_to_remove(step, false)
                .unwrap();
        }
        let steps = strategy.checkpoint_steps();
        // The survivors are the most recent step plus high-level (multiples
        // of powers of the base) checkpoints; never a run of stale level-0
        // steps.
        assert_eq!(*steps.last().unwrap(), 64);
        assert_eq!(steps[0], 0);
        for step in &steps[1..steps.len() - 1] {
            assert_eq!(step % 4, 0, "retained step {step} should be a base multiple");
        }
    }

    // ========================================================================
    // Persistence and Capacity Tests
    // ========================================================================

    #[test]
    fn test_persistent_add_grows_capacity() {
        let mut strategy = WangCheckpointStrategy::new(2);
        assert_eq!(strategy.capacity(), 2);
        strategy.add_checkpoint_and_get_index_to_remove(0, true).unwrap();
        assert_eq!(strategy.capacity(), 3);
        assert_eq!(strategy.size(), 1);
    }

    #[test]
    fn test_persistent_slot_never_evicted_or_erased() {
        let mut strategy = WangCheckpointStrategy::new(1);
        strategy.add_checkpoint_and_get_index_to_remove(0, true).unwrap();
        for step in 1..=5 {
            let evicted = strategy
                .add_checkpoint_and_get_index_to_remove(step, false)
                .unwrap();
            assert_ne!(evicted, 0);
        }
        assert!(strategy.contains_step(0));
        assert!(!strategy.erase_step(0));
        assert!(strategy.contains_step(0));
    }

    #[test]
    fn test_zero_budget_eviction_fails() {
        let mut strategy = WangCheckpointStrategy::new(0);
        strategy.add_checkpoint_and_get_index_to_remove(0, true).unwrap();
        let result = strategy.add_checkpoint_and_get_index_to_remove(1, false);
        assert_eq!(
            result,
            Err(CheckpointError::NoEvictableSlot { capacity: 1 })
        );
        // The failed call must not have mutated anything.
        assert_eq!(strategy.checkpoint_steps(), vec![0]);
        assert_eq!(strategy.metrics().stores, 1);
    }

    // ========================================================================
    // Contract Edge Cases
    // ========================================================================

    #[test]
    fn test_duplicate_add_fails_without_mutation() {
        let mut strategy = WangCheckpointStrategy::new(3);
        strategy.add_checkpoint_and_get_index_to_remove(5, false).unwrap();
        let before = strategy.metrics();
        let result = strategy.add_checkpoint_and_get_index_to_remove(5, false);
        assert_eq!(result, Err(CheckpointError::DuplicateStep { step: 5 }));
        assert_eq!(strategy.metrics(), before);
        assert_eq!(strategy.size(), 1);
    }

    #[test]
    fn test_last_checkpoint_step_empty_fails() {
        let strategy = WangCheckpointStrategy::new(3);
        assert_eq!(strategy.last_checkpoint_step(), Err(CheckpointError::Empty));
    }

    #[test]
    fn test_reset_keeps_persistent_slots_and_metrics() {
        let mut strategy = WangCheckpointStrategy::new(3);
        strategy.add_checkpoint_and_get_index_to_remove(0, true).unwrap();
        strategy.add_checkpoint_and_get_index_to_remove(1, false).unwrap();
        strategy.add_checkpoint_and_get_index_to_remove(2, false).unwrap();
        let metrics = strategy.metrics();

        strategy.reset();

        assert_eq!(strategy.checkpoint_steps(), vec![0]);
        assert_eq!(strategy.metrics(), metrics);

        strategy.reset_metrics();
        assert_eq!(strategy.metrics(), CheckpointMetrics::default());
    }

    #[test]
    fn test_print_lists_slots_in_step_order() {
        let mut strategy = WangCheckpointStrategy::new(3);
        strategy.add_checkpoint_and_get_index_to_remove(0, true).unwrap();
        strategy.add_checkpoint_and_get_index_to_remove(2, false).unwrap();
        strategy.add_checkpoint_and_get_index_to_remove(1, false).unwrap();

        let dump = strategy.to_string();
        assert_eq!(
            dump,
            "CHECKPOINTS (Wang): capacity = 4\n   step=0 (persistent)\n   step=1\n   step=2\n"
        );
    }
}

//! Default-strategy facade.

use core::fmt;

use crate::error::CheckpointError;
use crate::metrics::CheckpointMetrics;
use crate::strategy::{
    write_diagnostic, CheckpointStrategy, StepIndex, WangCheckpointStrategy,
};

/// Default number of non-persistent slots granted by [`CheckpointManager`].
pub const DEFAULT_MAX_NUM_STATES: usize = 20;

/// Facade that owns a checkpoint strategy behind the common contract.
///
/// The inner strategy (Wang's level-based policy) is constructed lazily on
/// the first mutating call, reading `max_num_states` at that moment. Until
/// then the budget may be adjusted with
/// [`set_max_num_states`](Self::set_max_num_states); afterwards the budget
/// is locked and writes fail with [`CheckpointError::CapacityLocked`].
/// Read-only calls on an unbuilt manager answer from the empty state
/// without forcing construction.
///
/// All operations delegate one-for-one to the inner strategy.
#[derive(Debug)]
pub struct CheckpointManager {
    max_num_states: usize,
    inner: Option<WangCheckpointStrategy>,
}

impl CheckpointManager {
    /// Creates a manager that will grant `max_num_states` slots.
    pub fn new(max_num_states: usize) -> Self {
        Self {
            max_num_states,
            inner: None,
        }
    }

    /// The slot budget the strategy is (or will be) built with.
    #[inline]
    pub fn max_num_states(&self) -> usize {
        self.max_num_states
    }

    /// Adjusts the slot budget before the strategy exists.
    ///
    /// # Errors
    ///
    /// [`CheckpointError::CapacityLocked`] once the inner strategy has been
    /// constructed; the budget is immutable from that point on.
    pub fn set_max_num_states(&mut self, max_num_states: usize) -> Result<(), CheckpointError> {
        if self.inner.is_some() {
            return Err(CheckpointError::CapacityLocked);
        }
        self.max_num_states = max_num_states;
        Ok(())
    }

    /// Whether the inner strategy has been constructed yet.
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.inner.is_some()
    }

    fn inner_mut(&mut self) -> &mut WangCheckpointStrategy {
        self.inner
            .get_or_insert_with(|| WangCheckpointStrategy::new(self.max_num_states))
    }
}

impl Default for CheckpointManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NUM_STATES)
    }
}

impl CheckpointStrategy for CheckpointManager {
    fn name(&self) -> &'static str {
        "Wang"
    }

    fn add_checkpoint_and_get_index_to_remove(
        &mut self,
        step: StepIndex,
        persistent: bool,
    ) -> Result<StepIndex, CheckpointError> {
        self.inner_mut()
            .add_checkpoint_and_get_index_to_remove(step, persistent)
    }

    fn last_checkpoint_step(&self) -> Result<StepIndex, CheckpointError> {
        match &self.inner {
            Some(strategy) => strategy.last_checkpoint_step(),
            None => Err(CheckpointError::Empty),
        }
    }

    fn erase_step(&mut self, step: StepIndex) -> bool {
        self.inner_mut().erase_step(step)
    }

    fn contains_step(&self, step: StepIndex) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|strategy| strategy.contains_step(step))
    }

    fn reset(&mut self) {
        if let Some(strategy) = &mut self.inner {
            strategy.reset();
        }
    }

    fn capacity(&self) -> usize {
        match &self.inner {
            Some(strategy) => strategy.capacity(),
            None => self.max_num_states,
        }
    }

    fn size(&self) -> usize {
        self.inner.as_ref().map_or(0, |strategy| strategy.size())
    }

    fn checkpoint_steps(&self) -> Vec<StepIndex> {
        self.inner
            .as_ref()
            .map_or_else(Vec::new, |strategy| strategy.checkpoint_steps())
    }

    fn record_recomputation(&mut self) {
        self.inner_mut().record_recomputation();
    }

    fn metrics(&self) -> CheckpointMetrics {
        self.inner
            .as_ref()
            .map_or_else(CheckpointMetrics::default, |strategy| strategy.metrics())
    }

    fn reset_metrics(&mut self) {
        if let Some(strategy) = &mut self.inner {
            strategy.reset_metrics();
        }
    }

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        match &self.inner {
            Some(strategy) => strategy.print(out),
            None => write_diagnostic(out, self.name(), self.max_num_states, core::iter::empty()),
        }
    }
}

impl fmt::Display for CheckpointManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print(f)
    }
}

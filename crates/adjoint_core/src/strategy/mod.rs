//! Checkpoint placement strategies.
//!
//! A strategy decides, online, which intermediate states of a time-stepped
//! forward computation stay in a bounded in-memory store and which are
//! discarded. During the reverse sweep the driver asks the strategy for the
//! greatest retained step and replays the forward iteration from there,
//! charging the replays to the strategy's recomputation counter.
//!
//! Two policies are provided behind the same contract:
//!
//! - [`WangCheckpointStrategy`]: level-based dispensability ranking with a
//!   logarithmic recomputation factor
//! - [`OnlineR2CheckpointStrategy`]: minimum merged-gap eviction keeping
//!   checkpoints approximately uniformly spaced

mod online_r2;
mod wang;

pub use online_r2::OnlineR2CheckpointStrategy;
pub use wang::WangCheckpointStrategy;

use core::fmt;

use crate::error::CheckpointError;
use crate::metrics::CheckpointMetrics;

/// Index of a forward step. Step 0 is the initial condition.
pub type StepIndex = usize;

/// Sentinel returned by `add_checkpoint_and_get_index_to_remove` when no
/// eviction occurred. Callers test with [`valid_checkpoint_index`].
pub const INVALID_CHECKPOINT_INDEX: StepIndex = StepIndex::MAX;

/// Returns true iff `index` denotes an actual step rather than the
/// no-eviction sentinel.
#[inline]
pub fn valid_checkpoint_index(index: StepIndex) -> bool {
    index != INVALID_CHECKPOINT_INDEX
}

/// Online checkpoint placement policy.
///
/// Implementations own a bounded set of slots, each uniquely keyed by its
/// step index and flagged persistent or not. Persistent slots are immune to
/// eviction and each one grants one extra unit of effective capacity.
///
/// # Contract
///
/// - After a successful `add`, the added step is stored; if a non-sentinel
///   step is returned, that step was stored immediately before the call and
///   is no longer stored. At most one eviction happens per call.
/// - The number of non-persistent slots never exceeds the constructed slot
///   budget once `add` returns.
/// - A failing call ([`CheckpointError`]) leaves the strategy unmodified.
pub trait CheckpointStrategy: fmt::Debug {
    /// Short policy name used in the diagnostic dump header.
    fn name(&self) -> &'static str;

    /// Registers `step` as checkpointed and reports which previously stored
    /// step must be released, or [`INVALID_CHECKPOINT_INDEX`] if none.
    ///
    /// Persistent registrations grow the effective capacity by one and
    /// never evict.
    ///
    /// # Errors
    ///
    /// [`CheckpointError::DuplicateStep`] if `step` is already stored;
    /// implementations may also fail when an eviction is required but every
    /// slot is persistent.
    fn add_checkpoint_and_get_index_to_remove(
        &mut self,
        step: StepIndex,
        persistent: bool,
    ) -> Result<StepIndex, CheckpointError>;

    /// Greatest stored step.
    ///
    /// # Errors
    ///
    /// [`CheckpointError::Empty`] if no slot is stored.
    fn last_checkpoint_step(&self) -> Result<StepIndex, CheckpointError>;

    /// Removes the slot for `step` iff it is present and non-persistent.
    /// Returns whether a removal occurred.
    fn erase_step(&mut self, step: StepIndex) -> bool;

    /// Whether a slot with this step is stored.
    fn contains_step(&self, step: StepIndex) -> bool;

    /// Removes every non-persistent slot. Metrics are unaffected.
    fn reset(&mut self);

    /// Current effective capacity, including persistent grants.
    fn capacity(&self) -> usize;

    /// Current slot count (persistent slots included).
    fn size(&self) -> usize;

    /// Stored steps in ascending order.
    fn checkpoint_steps(&self) -> Vec<StepIndex>;

    /// Returns true iff `index` is not the no-eviction sentinel.
    #[inline]
    fn valid_checkpoint_index(&self, index: StepIndex) -> bool {
        valid_checkpoint_index(index)
    }

    /// Charges one replayed forward iteration to the metrics.
    fn record_recomputation(&mut self);

    /// Snapshot of the metric counters.
    fn metrics(&self) -> CheckpointMetrics;

    /// Clears the metric counters.
    fn reset_metrics(&mut self);

    /// Writes the human-readable diagnostic dump:
    ///
    /// ```text
    /// CHECKPOINTS (<name>): capacity = <C>
    ///    step=<s> (persistent)
    /// ```
    ///
    /// One line per slot in step-sorted order.
    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result;
}

/// Shared `print` body for the concrete strategies and the manager facade.
pub(crate) fn write_diagnostic(
    out: &mut dyn fmt::Write,
    name: &str,
    capacity: usize,
    slots: impl Iterator<Item = (StepIndex, bool)>,
) -> fmt::Result {
    writeln!(out, "CHECKPOINTS ({name}): capacity = {capacity}")?;
    for (step, persistent) in slots {
        if persistent {
            writeln!(out, "   step={step} (persistent)")?;
        } else {
            writeln!(out, "   step={step}")?;
        }
    }
    Ok(())
}

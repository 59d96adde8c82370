//! Error types for checkpoint strategies.

use thiserror::Error;

use crate::strategy::StepIndex;

/// Errors raised when a strategy is driven into a forbidden state.
///
/// Every variant is an invariant violation and surfaces to the caller
/// unchanged; nothing is retried internally. A failing call leaves the
/// strategy unmodified.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckpointError {
    /// `last_checkpoint_step` was called on a strategy holding no slots.
    #[error("no checkpoint is stored")]
    Empty,

    /// A step was offered to `add_checkpoint_and_get_index_to_remove` while
    /// already checkpointed.
    #[error("step {step} is already checkpointed")]
    DuplicateStep {
        /// The step that was offered twice.
        step: StepIndex,
    },

    /// An eviction was required but every stored slot is persistent.
    ///
    /// Unreachable when the capacity covers at least one non-persistent
    /// slot; the sweep driver precludes it by registering the initial
    /// condition persistently.
    #[error("no evictable checkpoint slot (capacity: {capacity})")]
    NoEvictableSlot {
        /// Effective capacity at the time of the call.
        capacity: usize,
    },

    /// The manager's slot budget was written after its strategy had
    /// already been constructed.
    #[error("slot budget is locked once the strategy has been constructed")]
    CapacityLocked,
}

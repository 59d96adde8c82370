//! Forward/reverse sweep driver with on-demand recomputation.

use std::collections::BTreeMap;

use thiserror::Error;

use adjoint_core::{
    valid_checkpoint_index, CheckpointError, CheckpointStrategy, StepIndex,
    WangCheckpointStrategy,
};

/// Errors surfaced by [`advance_and_reverse_steps`].
///
/// `E` is the caller's own error type, raised by the `update` or
/// `reverse_cb` callbacks and propagated unchanged as the source of
/// [`SweepError::Callback`].
#[derive(Debug, Error)]
pub enum SweepError<E>
where
    E: std::error::Error + 'static,
{
    /// A checkpoint strategy invariant was violated.
    #[error(transparent)]
    Strategy(#[from] CheckpointError),

    /// The caller-supplied `update` or `reverse_cb` failed.
    #[error("callback failed at step {step}")]
    Callback {
        /// Step at which the callback was invoked.
        step: StepIndex,
        /// The caller's error.
        #[source]
        source: E,
    },

    /// The state store had no entry for a step the strategy reports as
    /// retained. Indicates a caller bypassing the driver's bookkeeping.
    #[error("no saved state for step {step}")]
    StateNotFound {
        /// The step whose state was missing.
        step: StepIndex,
    },
}

/// Runs a forward computation of `num_steps` iterations under a checkpoint
/// budget of `storage_size` states, then back-propagates by invoking
/// `reverse_cb` once per step in strictly decreasing order, recomputing
/// discarded states from the nearest retained checkpoint on demand.
///
/// The state type `T` is opaque; it only needs to be cloneable. At most
/// `storage_size + 2` states are held at once (the budget, the persistent
/// initial condition, and the transient pre-insert state).
///
/// `update(i, x)` must return the state at step `i + 1` given the state at
/// step `i`, and **must be deterministic**: it is re-invoked with the same
/// arguments during the reverse sweep, and a nondeterministic update
/// silently yields wrong reconstructed states. `reverse_cb(i, x)` receives
/// the forward state `x_i` for every `i` in `num_steps..=1`.
///
/// When `strategy` is `None` a [`WangCheckpointStrategy`] with the given
/// budget is used. Passing a strategy borrow lets the caller inspect its
/// metrics after the sweep.
///
/// Returns the final forward state `x_N`.
///
/// # Errors
///
/// [`SweepError::Callback`] when `update` or `reverse_cb` fails;
/// [`SweepError::Strategy`] when the strategy is driven into a forbidden
/// state (for instance a zero budget, which leaves nothing to evict).
pub fn advance_and_reverse_steps<T, E>(
    num_steps: usize,
    storage_size: usize,
    x0: T,
    mut update: impl FnMut(StepIndex, &T) -> Result<T, E>,
    mut reverse_cb: impl FnMut(StepIndex, &T) -> Result<(), E>,
    strategy: Option<&mut dyn CheckpointStrategy>,
) -> Result<T, SweepError<E>>
where
    T: Clone,
    E: std::error::Error + 'static,
{
    let mut default_strategy;
    let cps: &mut dyn CheckpointStrategy = match strategy {
        Some(strategy) => strategy,
        None => {
            default_strategy = WangCheckpointStrategy::new(storage_size);
            &mut default_strategy
        }
    };

    let mut saved: BTreeMap<StepIndex, T> = BTreeMap::new();
    let mut current = x0.clone();
    saved.insert(0, x0);
    cps.add_checkpoint_and_get_index_to_remove(0, true)?;

    for step in 0..num_steps {
        let next =
            update(step, &current).map_err(|source| SweepError::Callback { step, source })?;
        let evicted = cps.add_checkpoint_and_get_index_to_remove(step + 1, false)?;
        if valid_checkpoint_index(evicted) {
            saved.remove(&evicted);
        }
        saved.insert(step + 1, next.clone());
        current = next;
    }

    let final_state = current;

    for step in (1..=num_steps).rev() {
        // Restore: replay forward from the greatest retained step until the
        // state for `step` is available again. Replays are charged to the
        // strategy's recomputation counter and may re-checkpoint the span
        // they cross with the capacity freed by the sweep so far.
        loop {
            let last = cps.last_checkpoint_step()?;
            if last >= step {
                break;
            }
            let replayed = {
                let base = saved
                    .get(&last)
                    .ok_or(SweepError::StateNotFound { step: last })?;
                update(last, base).map_err(|source| SweepError::Callback { step: last, source })?
            };
            let evicted = cps.add_checkpoint_and_get_index_to_remove(last + 1, false)?;
            if valid_checkpoint_index(evicted) {
                saved.remove(&evicted);
            }
            // A strategy with nothing to evict drops the new slot; without
            // the replayed step retained the restore loop cannot advance.
            if !cps.contains_step(last + 1) {
                return Err(SweepError::Strategy(CheckpointError::NoEvictableSlot {
                    capacity: cps.capacity(),
                }));
            }
            saved.insert(last + 1, replayed);
            cps.record_recomputation();
        }

        let state = saved.get(&step).ok_or(SweepError::StateNotFound { step })?;
        reverse_cb(step, state).map_err(|source| SweepError::Callback { step, source })?;

        cps.erase_step(step);
        saved.remove(&step);
    }

    Ok(final_state)
}

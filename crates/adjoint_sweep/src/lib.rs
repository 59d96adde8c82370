//! Forward/reverse sweep driver for checkpointed sensitivity analysis.
//!
//! Couples an opaque time-stepped forward computation with a checkpoint
//! placement strategy from [`adjoint_core`]: the forward sweep advances the
//! state and lets the strategy decide which intermediate states stay
//! resident, and the reverse sweep walks the steps backwards, replaying
//! forward iterations from the nearest retained checkpoint whenever a
//! discarded state is needed again.
//!
//! # Example
//!
//! ```
//! use adjoint_sweep::advance_and_reverse_steps;
//! use std::convert::Infallible;
//!
//! let mut adjoint_log = Vec::new();
//! let x_final = advance_and_reverse_steps(
//!     5,
//!     3,
//!     0u64,
//!     |_, x| Ok::<_, Infallible>(x + 1),
//!     |step, x| {
//!         adjoint_log.push((step, *x));
//!         Ok(())
//!     },
//!     None,
//! )?;
//!
//! assert_eq!(x_final, 5);
//! assert_eq!(adjoint_log, vec![(5, 5), (4, 4), (3, 3), (2, 2), (1, 1)]);
//! # Ok::<(), adjoint_sweep::SweepError<Infallible>>(())
//! ```

pub mod sweep;

pub use sweep::{advance_and_reverse_steps, SweepError};

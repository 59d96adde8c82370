//! Online checkpoint placement for reverse-mode sensitivity analysis.
//!
//! A time-stepped forward computation produces states `x_0, x_1, ..., x_N`;
//! the reverse sweep then needs every intermediate state in reverse order.
//! Keeping all of them costs O(N) memory. This crate instead keeps a bounded
//! set of *checkpoints* and lets the missing states be recomputed from the
//! nearest retained predecessor, trading a logarithmic amount of extra
//! forward work for a fixed memory budget.
//!
//! # Key Components
//!
//! - [`CheckpointStrategy`]: the contract every placement policy satisfies
//! - [`WangCheckpointStrategy`]: level-based dispensability ranking
//! - [`OnlineR2CheckpointStrategy`]: minimum merged-gap, uniform spacing
//! - [`CheckpointManager`]: lazily-built facade defaulting to Wang
//! - [`CheckpointMetrics`]: store/eviction/recomputation counters
//!
//! Both policies are *online*: neither needs the total step count in
//! advance, which is what distinguishes them from the classical offline
//! binomial schedule.
//!
//! # Example
//!
//! ```
//! use adjoint_core::{CheckpointStrategy, OnlineR2CheckpointStrategy};
//!
//! let mut strategy = OnlineR2CheckpointStrategy::new(3);
//!
//! // The initial condition is persistent and grants an extra slot.
//! strategy.add_checkpoint_and_get_index_to_remove(0, true)?;
//!
//! for step in 1..=10 {
//!     let evicted = strategy.add_checkpoint_and_get_index_to_remove(step, false)?;
//!     if strategy.valid_checkpoint_index(evicted) {
//!         // release the state stored for `evicted`
//!     }
//! }
//!
//! assert_eq!(strategy.last_checkpoint_step()?, 10);
//! assert_eq!(strategy.size(), 4);
//! # Ok::<(), adjoint_core::CheckpointError>(())
//! ```

pub mod error;
pub mod manager;
pub mod metrics;
pub mod strategy;

pub use error::CheckpointError;
pub use manager::{CheckpointManager, DEFAULT_MAX_NUM_STATES};
pub use metrics::CheckpointMetrics;
pub use strategy::{
    valid_checkpoint_index, CheckpointStrategy, OnlineR2CheckpointStrategy, StepIndex,
    WangCheckpointStrategy, INVALID_CHECKPOINT_INDEX,
};

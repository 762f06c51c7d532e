//! A concurrent mutual-exclusion primitive — the Action Chain — that
//! serializes arbitrary caller-supplied actions while guaranteeing
//! system-wide progress.
//!
//! An [`ActionChain`] is a drop-in alternative to a mutex when the critical
//! sections are small and contention is high. Rather than parking
//! contending threads on a lock, [`ActionChain::run`] forms a linked chain
//! of pending actions and lets exactly one thread at a time execute the
//! chain on behalf of every thread that published to it:
//!
//! - publishing a new action (the producer side of `run`) is **wait-free**:
//!   it performs a bounded number of atomic operations before either
//!   returning or entering the drain loop itself;
//! - the drain loop that actually runs actions is **lock-free**: it makes
//!   progress as long as some thread is scheduled, and never waits on
//!   another thread;
//! - actions on the same chain always execute in the order their `run`
//!   calls won the race to publish, and no two actions on the same chain
//!   ever execute concurrently.
//!
//! There is no fairness guarantee beyond FIFO, no priority inversion
//! avoidance, no cancellation, and no cross-process semantics. An action,
//! once published, always eventually runs; there is no way to time one out
//! or withdraw it.
//!
//! # Oversized actions
//!
//! Every action is stored inline, in the same fixed-size allocation as its
//! node, so it must fit within [`ALLOC_SIZE`] bytes together with the
//! node's own bookkeeping, and its alignment must not exceed
//! [`SLAB_ALIGN`]. Violating either is a compile-time error.
//!
//! # Example
//!
//! ```
//! use action_chain::ActionChain;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let chain = ActionChain::new();
//! let counter = AtomicUsize::new(0);
//! chain.run(|| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//! assert_eq!(counter.load(Ordering::SeqCst), 1);
//! ```

mod chain;
mod mem;
mod node;
mod sync;

pub use chain::ActionChain;
pub use mem::Mem;

/// Size, in bytes, of every node-plus-action allocation this crate makes.
/// Chosen to hold the fixed node header (an atomic pointer and a function
/// pointer) plus a comfortably-sized closure capture; actions that do not
/// fit are rejected at compile time.
pub const ALLOC_SIZE: usize = 64;

/// Minimum alignment guaranteed for every slab allocation, and therefore
/// the largest alignment an action may require.
pub const SLAB_ALIGN: usize = 16;

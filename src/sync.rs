//! Indirection over the atomic primitives this crate touches, so that the
//! handoff protocol in `node` and `chain` can be re-run under loom's model
//! checker without duplicating any logic.
//!
//! Everything here is a straight re-export; nothing is renamed or adapted,
//! because loom's `AtomicPtr` is API-compatible with `std`'s for the small
//! surface (`new`, `swap`, `load`) this crate uses. Thread spawning is only
//! ever needed from test code, which reaches for `loom::thread` or
//! `std::thread` directly rather than through this shim.

#[cfg(feature = "loom")]
pub(crate) use loom::sync::atomic::{AtomicPtr, Ordering};

#[cfg(not(feature = "loom"))]
pub(crate) use std::sync::atomic::{AtomicPtr, Ordering};

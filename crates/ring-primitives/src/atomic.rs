//! Atomic types used by the sticky counters, swapped for `loom`'s shadow
//! atomics under `--cfg loom` so their CAS-retry paths can be exhaustively
//! model-checked instead of only probed by real-thread stress tests.

#[cfg(loom)]
pub(crate) use loom::sync::atomic::{AtomicU64, Ordering};
#[cfg(not(loom))]
pub(crate) use std::sync::atomic::{AtomicU64, Ordering};

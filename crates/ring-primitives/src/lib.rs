//! Lock-free and wait-free primitives for high-throughput, low-latency
//! inter-thread communication: a seqlock for single-writer/many-reader value
//! publication, a zero-sticky reference counter (lock-free and wait-free
//! variants), and bounded SPSC/MPMC ring queues.
//!
//! Each primitive is self-contained; the only thing they share is the
//! cache-line-size constant in [`ring_utils`].

mod atomic;
mod error;
mod mpmc;
mod seqlock;
mod spsc;
mod sticky_counter_lf;
mod sticky_counter_wf;

pub use error::InvalidCapacity;
pub use mpmc::MpmcQueue;
pub use seqlock::SeqLock;
pub use spsc::SpscQueue;
pub use sticky_counter_lf::StickyCounterLf;
pub use sticky_counter_wf::StickyCounterWf;

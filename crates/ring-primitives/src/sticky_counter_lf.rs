use crate::atomic::{AtomicU64, Ordering};

/// A reference counter that can't rise back up once it reaches zero.
///
/// All operations use relaxed ordering: the counter carries no data to
/// publish, only the fact of having reached (or not reached) zero.
#[repr(C, align(64))]
pub struct StickyCounterLf {
    value: AtomicU64,
}

impl StickyCounterLf {
    /// Starts the counter at the conventional initial reference count of 1.
    #[inline]
    #[cfg(not(loom))]
    pub const fn new() -> Self {
        Self::with_initial(1)
    }

    #[inline]
    #[cfg(loom)]
    pub fn new() -> Self {
        Self::with_initial(1)
    }

    #[inline]
    #[cfg(not(loom))]
    pub const fn with_initial(initial: u64) -> Self {
        Self { value: AtomicU64::new(initial) }
    }

    #[inline]
    #[cfg(loom)]
    pub fn with_initial(initial: u64) -> Self {
        Self { value: AtomicU64::new(initial) }
    }

    /// Lock-free: a CAS loop that retries only on contention, never on the
    /// counter actually being zero.
    #[inline]
    pub fn increment_if_not_zero(&self) -> bool {
        let mut current = self.value.load(Ordering::Relaxed);
        loop {
            if current == 0 {
                return false;
            }
            match self.value.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    /// Returns `true` iff this call is the one that drove the counter from
    /// 1 to 0 (the latching decrement).
    #[inline]
    pub fn decrement(&self) -> bool {
        self.value.fetch_sub(1, Ordering::Relaxed) == 1
    }

    #[inline]
    pub fn read(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Default for StickyCounterLf {
    fn default() -> Self {
        Self::new()
    }
}


/// Model-checked under `RUSTFLAGS="--cfg loom" cargo test --lib`:
/// exhaustively explores thread interleavings instead of only sampling them,
/// for a state space small enough that loom can cover it in full.
#[cfg(all(test, loom))]
mod loom_tests {
    use super::*;

    #[test]
    fn two_decrementers_exactly_one_latches() {
        loom::model(|| {
            let counter = loom::sync::Arc::new(StickyCounterLf::with_initial(2));
            let threads: Vec<_> = (0..2)
                .map(|_| {
                    let counter = counter.clone();
                    loom::thread::spawn(move || counter.decrement())
                })
                .collect();

            let latches =
                threads.into_iter().map(|h| h.join().unwrap()).filter(|&latched| latched).count();
            assert_eq!(latches, 1);
            assert_eq!(counter.read(), 0);
            assert!(!counter.increment_if_not_zero());
        });
    }
}

use crate::atomic::{AtomicU64, Ordering};

/// `ZERO` set: the counter has latched to zero.
const ZERO: u64 = 1 << 63;
/// `HELPED` set: a reader raced the latching decrement and already marked
/// `ZERO`, so the decrementer takes credit instead of CAS-ing it itself.
const HELPED: u64 = 1 << 62;
const FLAGS: u64 = ZERO | HELPED;

/// Wait-free equivalent of [`StickyCounterLf`](crate::StickyCounterLf): every
/// operation is a bounded number of atomic RMWs, with at most one retry.
///
/// Encodes state in a single word: the low 62 bits are the logical count
/// while not latched; once `ZERO` is set those bits are meaningless and
/// never read again.
#[repr(C, align(64))]
pub struct StickyCounterWf {
    word: AtomicU64,
}

impl StickyCounterWf {
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
        Self { word: AtomicU64::new(initial) }
    }

    #[inline]
    #[cfg(loom)]
    pub fn with_initial(initial: u64) -> Self {
        Self { word: AtomicU64::new(initial) }
    }

    /// Unconditional fetch-add; returns `true` iff the prior word had `ZERO`
    /// clear. Once `ZERO` is set it never clears, so a transient overshoot
    /// of the low bits after latching is harmless: it's reported as failure
    /// and never observed by [`read`](Self::read), which masks on `ZERO`.
    #[inline]
    pub fn increment_if_not_zero(&self) -> bool {
        let prior = self.word.fetch_add(1, Ordering::Relaxed);
        prior & ZERO == 0
    }

    /// Fetch-subtract; at most one retry, driven purely by the monotonic
    /// `HELPED` flag.
    #[inline]
    pub fn decrement(&self) -> bool {
        let prior = self.word.fetch_sub(1, Ordering::Relaxed);
        if prior != 1 {
            return false;
        }

        let v = self.word.load(Ordering::Relaxed);
        match self.word.compare_exchange(v, ZERO, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => true,
            // A reader beat us to it; the value it actually wrote is what
            // matters here, not our stale pre-CAS snapshot.
            Err(observed) => {
                let helped = observed & HELPED != 0;
                if helped {
                    tracing::trace!("decrement: took credit for a reader-helped latch");
                }
                helped
            }
        }
    }

    /// Relaxed load; if caught mid-transition (`v == 0`) helps latch by
    /// setting `ZERO | HELPED` so the racing `decrement` can take credit.
    #[inline]
    pub fn read(&self) -> u64 {
        let v = self.word.load(Ordering::Relaxed);
        if v == 0 {
            if self
                .word
                .compare_exchange(0, ZERO | HELPED, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                tracing::trace!("read: helped latch a decrement caught mid-transition");
            }
            return 0;
        }
        if v & ZERO != 0 { 0 } else { v & !FLAGS }
    }
}

impl Default for StickyCounterWf {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn single_thread_latches_at_zero() {
        let c = StickyCounterWf::with_initial(2);
        assert!(c.increment_if_not_zero());
        assert_eq!(c.read(), 3);
        assert!(!c.decrement()); // 3 -> 2
        assert!(!c.decrement()); // 2 -> 1
        assert!(c.decrement()); // 1 -> 0, latches
        assert_eq!(c.read(), 0);
        assert!(!c.increment_if_not_zero());
        assert_eq!(c.read(), 0);
    }

    #[test]
    fn concurrent_decrement_exactly_one_latch() {
        const THREADS: usize = 8;
        const PER_THREAD: u64 = 1250;
        let counter = StickyCounterWf::with_initial(THREADS as u64 * PER_THREAD);
        let latches = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    for _ in 0..PER_THREAD {
                        if counter.decrement() {
                            latches.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            }
        });

        assert_eq!(latches.load(Ordering::Relaxed), 1);
        assert_eq!(counter.read(), 0);
        assert!(!counter.increment_if_not_zero());
        assert_eq!(counter.read(), 0);
    }

    #[test]
    fn concurrent_read_and_decrement_race_to_zero() {
        // Many readers hammering read() while a single decrementer drives
        // the count to zero, to exercise the v==0 helping path.
        let counter = StickyCounterWf::with_initial(1);
        let stop = std::sync::atomic::AtomicBool::new(false);

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    while !stop.load(Ordering::Relaxed) {
                        let _ = counter.read();
                    }
                });
            }
            s.spawn(|| {
                assert!(counter.decrement());
                stop.store(true, Ordering::Relaxed);
            });
        });

        assert_eq!(counter.read(), 0);
        assert!(!counter.increment_if_not_zero());
    }
}

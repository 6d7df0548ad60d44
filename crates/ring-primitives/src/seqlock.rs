use std::{
    cell::UnsafeCell,
    fmt,
    sync::atomic::{AtomicU64, Ordering, compiler_fence},
};

/// Publishes a single `Copy` value from one writer thread to many readers.
///
/// The sequence counter is even iff no write is in progress; readers spin
/// until they observe a stable, even sequence either side of their copy.
#[repr(C, align(64))]
pub struct SeqLock<T> {
    seq: AtomicU64,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for SeqLock<T> {}
unsafe impl<T: Send> Sync for SeqLock<T> {}

impl<T: Copy> SeqLock<T> {
    #[inline]
    pub const fn new(value: T) -> Self {
        Self { seq: AtomicU64::new(0), data: UnsafeCell::new(value) }
    }

    /// Current sequence number. Even means no write is in flight.
    #[inline]
    pub fn version(&self) -> u64 {
        self.seq.load(Ordering::Relaxed)
    }

    /// Wait-free: bounded number of steps regardless of reader contention.
    #[inline]
    pub fn write(&self, value: T) {
        let v = self.seq.fetch_add(1, Ordering::Relaxed);
        compiler_fence(Ordering::AcqRel);
        unsafe { *self.data.get() = value };
        compiler_fence(Ordering::AcqRel);
        self.seq.store(v.wrapping_add(2), Ordering::Release);
    }

    /// Obstruction-free with respect to writes: always completes once writes
    /// halt. Spins (with a pause hint) on a torn or sped-past read.
    #[inline]
    pub fn read(&self) -> T {
        loop {
            let s1 = self.seq.load(Ordering::Acquire);
            if s1 & 1 == 0 {
                let copy = unsafe { *self.data.get() };
                let s2 = self.seq.load(Ordering::Relaxed);
                if s1 == s2 {
                    return copy;
                }
            }
            std::hint::spin_loop();
        }
    }
}

impl<T: Copy + Default> Default for SeqLock<T> {
    #[inline]
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for SeqLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeqLock {{ version: {}, data: {:?} }}", self.version(), self.read())
    }
}

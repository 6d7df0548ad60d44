use std::{
    cell::UnsafeCell,
    mem::MaybeUninit,
    sync::atomic::{AtomicU64, Ordering},
};

use ring_utils::CachePadded;

use crate::error::InvalidCapacity;

/// One ring slot: a sequence number (which cycle/role the slot is in) kept
/// on its own cache line, separate from the storage it guards. `seq` is
/// wrapped in `CachePadded` so its line is reserved regardless of `T`'s
/// size, rather than computing a pad array from `size_of::<T>()`.
#[repr(C, align(64))]
struct Slot<T> {
    seq: CachePadded<AtomicU64>,
    storage: UnsafeCell<MaybeUninit<T>>,
}

unsafe impl<T: Send> Send for Slot<T> {}
unsafe impl<T: Send> Sync for Slot<T> {}

/// Bounded multi-producer/multi-consumer ring queue (the Vyukov scheme).
///
/// Lock-free, not wait-free: a contending CAS on `head`/`tail` may force a
/// retry, but at least one thread always makes progress.
pub struct MpmcQueue<T> {
    buffer: Box<[Slot<T>]>,
    mask: usize,
    tail: CachePadded<AtomicU64>,
    head: CachePadded<AtomicU64>,
}

unsafe impl<T: Send> Send for MpmcQueue<T> {}
unsafe impl<T: Send> Sync for MpmcQueue<T> {}

impl<T> MpmcQueue<T> {
    pub fn new(capacity: usize) -> Result<Self, InvalidCapacity> {
        if capacity == 0 {
            return Err(InvalidCapacity::Zero);
        }
        if !capacity.is_power_of_two() {
            return Err(InvalidCapacity::NotPowerOfTwo(capacity));
        }

        let buffer = (0..capacity)
            .map(|i| Slot {
                seq: CachePadded::new(AtomicU64::new(i as u64)),
                storage: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect::<Box<[_]>>();

        Ok(Self {
            buffer,
            mask: capacity - 1,
            tail: CachePadded::new(AtomicU64::new(0)),
            head: CachePadded::new(AtomicU64::new(0)),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    #[inline]
    fn slot(&self, pos: u64) -> &Slot<T> {
        unsafe { self.buffer.get_unchecked(pos as usize & self.mask) }
    }

    /// Constructs `value` in the claimed slot; `false` if the queue is full.
    /// Rust's equivalent of the spec's `emplace(args...)`: there's no
    /// variadic placement-new, so moving `value` into the slot's storage
    /// plays that role.
    pub fn push(&self, value: T) -> bool {
        let mut pos = self.tail.load(Ordering::Relaxed);
        loop {
            let slot = self.slot(pos);
            let seq = slot.seq.load(Ordering::Acquire);

            match seq.cmp(&pos) {
                std::cmp::Ordering::Equal => {
                    match self.tail.compare_exchange_weak(
                        pos,
                        pos.wrapping_add(1),
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => {
                            unsafe { (*slot.storage.get()).write(value) };
                            slot.seq.store(pos.wrapping_add(1), Ordering::Release);
                            return true;
                        }
                        Err(observed) => pos = observed,
                    }
                }
                std::cmp::Ordering::Less => return false,
                std::cmp::Ordering::Greater => pos = self.tail.load(Ordering::Relaxed),
            }
        }
    }

    /// Moves the next element out into `out`'s slot via the return value;
    /// `None` if the queue is empty.
    pub fn pop(&self) -> Option<T> {
        let mut pos = self.head.load(Ordering::Relaxed);
        loop {
            let slot = self.slot(pos);
            let seq = slot.seq.load(Ordering::Acquire);
            let expected = pos.wrapping_add(1);

            match seq.cmp(&expected) {
                std::cmp::Ordering::Equal => {
                    match self.head.compare_exchange_weak(
                        pos,
                        pos.wrapping_add(1),
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => {
                            let value = unsafe { (*slot.storage.get()).assume_init_read() };
                            slot.seq.store(
                                pos.wrapping_add(self.capacity() as u64),
                                Ordering::Release,
                            );
                            return Some(value);
                        }
                        Err(observed) => pos = observed,
                    }
                }
                std::cmp::Ordering::Less => return None,
                std::cmp::Ordering::Greater => pos = self.head.load(Ordering::Relaxed),
            }
        }
    }
}

impl<T> Drop for MpmcQueue<T> {
    fn drop(&mut self) {
        for (i, slot) in self.buffer.iter().enumerate() {
            if slot.seq.load(Ordering::Relaxed) == i as u64 + 1 {
                unsafe { (*slot.storage.get()).assume_init_drop() };
            }
        }
    }
}

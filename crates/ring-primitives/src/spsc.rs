use std::{
    cell::UnsafeCell,
    mem::MaybeUninit,
    ptr,
    sync::atomic::{AtomicU64, Ordering},
};

use ring_utils::CachePadded;

use crate::error::InvalidCapacity;

/// Bounded single-producer/single-consumer ring queue.
///
/// Exactly one thread may call the producer-only methods
/// ([`push`](Self::push)) and exactly one (possibly different) thread may
/// call the consumer-only methods ([`front`](Self::front),
/// [`pop`](Self::pop)) over the queue's lifetime. Any other usage pattern is
/// undefined behaviour and is not detected.
///
/// Both sides are wait-free: every call takes a bounded number of steps,
/// there is no spinning inside the primitive.
pub struct SpscQueue<T> {
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: usize,
    tail: CachePadded<AtomicU64>,
    cached_head: CachePadded<UnsafeCell<u64>>,
    head: CachePadded<AtomicU64>,
    cached_tail: CachePadded<UnsafeCell<u64>>,
}

unsafe impl<T: Send> Send for SpscQueue<T> {}
unsafe impl<T: Send> Sync for SpscQueue<T> {}

impl<T> SpscQueue<T> {
    pub fn new(capacity: usize) -> Result<Self, InvalidCapacity> {
        if capacity == 0 {
            return Err(InvalidCapacity::Zero);
        }
        if !capacity.is_power_of_two() {
            return Err(InvalidCapacity::NotPowerOfTwo(capacity));
        }

        let buffer = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Box<[_]>>();

        Ok(Self {
            buffer,
            mask: capacity - 1,
            tail: CachePadded::new(AtomicU64::new(0)),
            cached_head: CachePadded::new(UnsafeCell::new(0)),
            head: CachePadded::new(AtomicU64::new(0)),
            cached_tail: CachePadded::new(UnsafeCell::new(0)),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    #[inline]
    fn slot(&self, pos: u64) -> *mut MaybeUninit<T> {
        unsafe { self.buffer.get_unchecked(pos as usize & self.mask) }.get()
    }

    /// Producer-only. Constructs `value` in place in the ring; `false` if the
    /// queue was full (the equivalent of the spec's `emplace(args...)` is
    /// just moving `value` in, since Rust has no variadic placement-new).
    #[inline]
    pub fn push(&self, value: T) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);
        let cached_head = unsafe { *self.cached_head.get() };

        if tail.wrapping_sub(cached_head) == self.capacity() as u64 {
            let head = self.head.load(Ordering::Relaxed);
            unsafe { *self.cached_head.get() = head };
            if tail.wrapping_sub(head) == self.capacity() as u64 {
                return false;
            }
        }

        unsafe { (*self.slot(tail)).write(value) };
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        true
    }

    /// Consumer-only. Borrows the next element without removing it; the
    /// pointer/reference stays valid until the matching [`pop`](Self::pop).
    #[inline]
    pub fn front(&self) -> Option<&T> {
        let head = self.head.load(Ordering::Relaxed);
        let cached_tail = unsafe { *self.cached_tail.get() };

        if head == cached_tail {
            // Acquire here (rather than on the `head` load above, which this
            // thread is the sole writer of) is what actually publishes the
            // producer's constructed slot; see DESIGN.md.
            let tail = self.tail.load(Ordering::Acquire);
            unsafe { *self.cached_tail.get() = tail };
            if head == tail {
                return None;
            }
        }

        Some(unsafe { (*self.slot(head)).assume_init_ref() })
    }

    /// Consumer-only. Precondition: a preceding [`front`](Self::front)
    /// returned `Some` and no other `pop` has intervened.
    #[inline]
    pub fn pop(&self) {
        let head = self.head.load(Ordering::Relaxed);
        unsafe { ptr::drop_in_place((*self.slot(head)).as_mut_ptr()) };
        self.head.store(head.wrapping_add(1), Ordering::Release);
    }
}

impl<T> Drop for SpscQueue<T> {
    fn drop(&mut self) {
        while self.front().is_some() {
            self.pop();
        }
    }
}

/// Coherence unit for the targets this crate cares about.
///
/// 64 bytes covers `x86_64` and `aarch64`; a target with a wider line (some
/// big.LITTLE ARM L2 configurations run 128B) would need to override this by
/// hand, there's no attempt at `target_arch`-based detection here.
pub const CACHE_LINE: usize = 64;

/// Bytes of padding needed to round `size` up to a multiple of [`CACHE_LINE`].
#[must_use]
pub const fn cacheline_pad(size: usize) -> usize {
    (CACHE_LINE - (size % CACHE_LINE)) % CACHE_LINE
}

/// Pads `T` out to its own cache line so a field that's hammered by one
/// thread can't false-share with a neighboring field hammered by another.
#[repr(C, align(64))]
#[derive(Debug, Default)]
pub struct CachePadded<T>(pub T);

impl<T> CachePadded<T> {
    #[inline]
    pub const fn new(value: T) -> Self {
        Self(value)
    }
}

impl<T> std::ops::Deref for CachePadded<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> std::ops::DerefMut for CachePadded<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_rounds_up_to_cache_line() {
        assert_eq!(cacheline_pad(0), 0);
        assert_eq!(cacheline_pad(1), 63);
        assert_eq!(cacheline_pad(64), 0);
        assert_eq!(cacheline_pad(65), 63);
    }

    #[test]
    fn cache_padded_is_a_full_line() {
        assert_eq!(std::mem::size_of::<CachePadded<u64>>(), CACHE_LINE);
        assert_eq!(std::mem::align_of::<CachePadded<u64>>(), CACHE_LINE);
    }
}

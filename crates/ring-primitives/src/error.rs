use thiserror::Error;

/// Raised synchronously from queue constructors when the requested capacity
/// can't back a ring buffer.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum InvalidCapacity {
    #[error("capacity must be non-zero")]
    Zero,
    #[error("capacity {0} is not a power of two")]
    NotPowerOfTwo(usize),
}

mod assert;
mod cacheline;
mod thread;

pub use cacheline::{CACHE_LINE, CachePadded, cacheline_pad};
pub use thread::{ThreadPriority, thread_boot};

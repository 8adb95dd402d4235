//! Buffer pool statistics tracking.

use std::fmt;

/// Counters kept by the buffer manager.
///
/// The manager is single-threaded and owns its counters, so they are plain
/// integers; [`BufferManager::stats`](crate::BufferManager::stats) hands out
/// a copy.
///
/// # Example
/// ```
/// use clockpool::BufferStats;
///
/// let stats = BufferStats {
///     cache_hits: 3,
///     cache_misses: 1,
///     ..BufferStats::default()
/// };
/// assert_eq!(stats.hit_rate(), 0.75);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BufferStats {
    /// Fetches served from a cached frame.
    pub cache_hits: u64,

    /// Fetches that had to read the page from its file.
    pub cache_misses: u64,

    /// Valid pages pushed out by the clock sweep.
    pub evictions: u64,

    /// Pages read from files.
    pub pages_read: u64,

    /// Pages written back to files.
    pub pages_written: u64,
}

impl BufferStats {
    /// Calculate cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for BufferStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ hits: {}, misses: {}, evictions: {}, reads: {}, writes: {}, hit_rate: {:.2}% }}",
            self.cache_hits,
            self.cache_misses,
            self.evictions,
            self.pages_read,
            self.pages_written,
            self.hit_rate() * 100.0
        )
    }
}

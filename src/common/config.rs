//! Configuration constants for clockpool.

/// Size of a page in bytes (4KB).
///
/// This value is chosen to match:
/// - OS page size on most systems (4096 bytes)
/// - Common database page sizes
///
/// # Alignment
/// Pages are aligned to 4096 bytes for efficient Direct I/O (O_DIRECT).
pub const PAGE_SIZE: usize = 4096;

/// Page-table buckets per frame, expressed as a ratio (6/5 = 1.2).
///
/// A little slack over one bucket per frame keeps chains short.
pub const PAGE_TABLE_LOAD_FACTOR: (usize, usize) = (6, 5);

/// How many times the clock hand may pass over every frame before
/// frame allocation gives up.
///
/// One pass can only clear reference bits, so a second pass is enough to
/// find any unpinned frame.
pub const SWEEP_PASSES: usize = 2;

/// Number of page-table buckets for a pool of `capacity` frames.
///
/// Roughly `1.2 × capacity`, forced odd.
///
/// # Example
/// ```
/// use clockpool::common::config::page_table_buckets;
///
/// assert_eq!(page_table_buckets(10), 13);
/// assert_eq!(page_table_buckets(3), 3);
/// assert_eq!(page_table_buckets(1), 1);
/// ```
pub fn page_table_buckets(capacity: usize) -> usize {
    let (num, den) = PAGE_TABLE_LOAD_FACTOR;
    (capacity * num / den) | 1
}

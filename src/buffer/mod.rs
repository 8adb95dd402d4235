//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache layer between callers and their
//! paged files. It manages a fixed pool of frames, each holding one page.
//!
//! # Components
//! - [`BufferManager`] - The page cache with clock replacement
//! - [`Frame`] - Bookkeeping for one slot of the pool
//! - [`PageGuard`] - RAII guard that unpins on drop
//! - [`BufferStats`] - Performance statistics
//!
//! The page table and clock hand are internal to the manager:
//! ```compile_fail
//! use clockpool::buffer::PageTable;
//! ```

mod buffer_manager;
mod clock;
mod frame;
mod page_guard;
mod page_table;
mod stats;

pub use buffer_manager::BufferManager;
pub(crate) use clock::ClockHand;
pub use frame::Frame;
pub use page_guard::PageGuard;
pub(crate) use page_table::PageTable;
pub use stats::BufferStats;

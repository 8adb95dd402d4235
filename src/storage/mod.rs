//! Storage layer - paged files and page buffers.
//!
//! This module handles the file side of the buffer pool:
//! - [`PagedFile`] - The contract every file store implements
//! - [`DiskFile`] - Pages in one OS file
//! - [`MemFile`] - Pages in memory, with call counters and fault injection
//! - [`page`] - The raw page buffer

mod disk_file;
mod mem_file;
pub mod page;
mod paged_file;

pub use disk_file::DiskFile;
pub use mem_file::MemFile;
pub use paged_file::{FileRef, PagedFile};

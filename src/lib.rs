//! clockpool - a single-threaded page cache with clock replacement.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     BufferManager                       │
//! │   frames[] + pool[]   PageTable   ClockHand   Stats     │
//! └─────────────────────────────────────────────────────────┘
//!                            ↓ read / write / allocate / dispose
//! ┌─────────────────────────────────────────────────────────┐
//! │                PagedFile (FileRef = Arc<dyn ..>)        │
//! │               DiskFile            MemFile               │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, FileId, Error, config)
//! - [`buffer`] - The buffer manager and its parts
//! - [`storage`] - Paged files and the page buffer
//!
//! # Quick Start
//! ```
//! use std::sync::Arc;
//! use clockpool::{BufferManager, FileRef, MemFile};
//!
//! let file: FileRef = Arc::new(MemFile::new());
//! let mut bpm = BufferManager::new(16);
//!
//! let (page_no, page) = bpm.alloc_page(&file)?;
//! page.as_mut_slice()[..5].copy_from_slice(b"hello");
//! bpm.unpin_page(&file, page_no, true)?;
//!
//! bpm.flush_file(&file)?;
//! # Ok::<(), clockpool::Error>(())
//! ```

pub mod buffer;
pub mod common;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, FileId, FrameId, PageId, Result};

pub use buffer::{BufferManager, BufferStats, Frame, PageGuard};
pub use storage::page::Page;
pub use storage::{DiskFile, FileRef, MemFile, PagedFile};

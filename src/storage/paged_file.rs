//! The file-store contract the buffer pool is written against.

use std::sync::Arc;

use crate::common::{PageId, Result};
use crate::storage::page::Page;

/// A file of fixed-size pages.
///
/// The buffer manager only ever talks to files through this trait. It reads
/// a page into a frame on a miss, writes a frame back when a dirty page is
/// evicted or flushed, and forwards page allocation and disposal.
///
/// # Design Decisions
///
/// 1. **`&self` methods**: the pool holds a shared handle per cached page
///    (`Arc<dyn PagedFile>`), so implementations keep their mutable state
///    behind a lock.
///
/// 2. **Caller-owned buffers**: `read_page` fills a page the pool owns;
///    the file never hands out its own memory.
///
/// 3. **No retries**: every call reports success or failure once. The pool
///    passes failures up unchanged.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so a whole buffer manager can be
/// moved behind a caller's lock.
pub trait PagedFile: Send + Sync {
    /// Reads page `page_no` into `page`.
    ///
    /// # Errors
    ///
    /// `Error::InvalidPage` if the page is not allocated, or `Error::Io`.
    fn read_page(&self, page_no: PageId, page: &mut Page) -> Result<()>;

    /// Writes `page` as page `page_no`.
    ///
    /// # Errors
    ///
    /// `Error::InvalidPage` if the page is not allocated, or `Error::Io`.
    fn write_page(&self, page_no: PageId, page: &Page) -> Result<()>;

    /// Allocates a fresh, zero-filled page and returns its number.
    fn allocate_page(&self) -> Result<PageId>;

    /// Releases page `page_no`. Its number may be handed out again.
    fn dispose_page(&self, page_no: PageId) -> Result<()>;
}

/// Shared handle to an open file.
///
/// Its identity is `FileId::of(&handle)`; clones of one handle are the same file.
pub type FileRef = Arc<dyn PagedFile>;

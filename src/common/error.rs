//! Error types for clockpool.

use thiserror::Error;

use crate::common::{FileId, FrameId, PageId};

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in clockpool.
///
/// The buffer manager never retries. File-store failures (`Io`,
/// `InvalidPage`) are handed back exactly as the file reported them.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from a file operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file has no such page (never allocated, or disposed).
    #[error("Invalid page: {0}")]
    InvalidPage(PageId),

    /// No frame could be freed within the bounded clock sweep.
    ///
    /// Every frame is pinned, or kept alive by its reference bit.
    #[error("Buffer pool exceeded: no evictable frame")]
    BufferExceeded,

    /// The page table refused an insert or remove.
    ///
    /// The frame table and page table disagree; this is not retried.
    #[error("Page table error for {page_no} of {file}")]
    PageTable { file: FileId, page_no: PageId },

    /// The page is not currently cached.
    #[error("{0} is not in the buffer pool")]
    PageNotCached(PageId),

    /// Attempted to unpin a page that wasn't pinned.
    #[error("{0} is not pinned")]
    PageNotPinned(PageId),

    /// A flush found a page that is still pinned.
    #[error("{0} is still pinned")]
    PagePinned(PageId),

    /// A frame names a file but holds no valid page.
    #[error("Corrupt buffer frame: {0}")]
    CorruptFrame(FrameId),

    /// The buffer pool must have at least one frame.
    #[error("Buffer pool capacity must be > 0")]
    InvalidCapacity,
}

impl Error {
    /// Whether this error came from the underlying file store.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_) | Error::InvalidPage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageNotCached(PageId::new(42));
        assert_eq!(format!("{}", err), "Page(42) is not in the buffer pool");

        let err = Error::BufferExceeded;
        assert_eq!(format!("{}", err), "Buffer pool exceeded: no evictable frame");

        let err = Error::CorruptFrame(FrameId::new(3));
        assert_eq!(format!("{}", err), "Corrupt buffer frame: Frame(3)");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {} // Success
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_is_io() {
        assert!(Error::Io(std::io::Error::other("disk")).is_io());
        assert!(Error::InvalidPage(PageId::new(1)).is_io());
        assert!(!Error::BufferExceeded.is_io());
        assert!(!Error::PagePinned(PageId::new(1)).is_io());
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error as _;

        let err = Error::Io(std::io::Error::other("disk"));
        assert!(err.source().is_some());
        assert!(Error::BufferExceeded.source().is_none());
    }
}

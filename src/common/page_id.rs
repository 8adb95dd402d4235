//! Page number type.

use std::fmt;

use crate::common::config::PAGE_SIZE;

/// A page number within one file.
///
/// Page numbers are only meaningful together with the file they belong to;
/// the buffer pool keys its page table on `(FileId, PageId)`.
///
/// # Example
/// ```
/// use clockpool::PageId;
///
/// let page_no = PageId::new(3);
/// assert!(page_no.is_valid());
/// assert_eq!(page_no.byte_offset(), 3 * 4096);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// Sentinel stored in frames that hold no page.
    pub const INVALID: PageId = PageId(u32::MAX);

    /// Create a new PageId.
    #[inline]
    pub fn new(id: u32) -> Self {
        PageId(id)
    }

    /// Check if this page number is real (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Offset of this page in a file of back-to-back pages.
    #[inline]
    pub fn byte_offset(&self) -> u64 {
        u64::from(self.0) * PAGE_SIZE as u64
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "Page({})", self.0)
        } else {
            write!(f, "Page(INVALID)")
        }
    }
}

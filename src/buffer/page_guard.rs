//! RAII guard for pinned page access.
//!
//! A [`PageGuard`] holds one pin on a page and releases it when dropped, so
//! a pin can't leak on an early return or `?`. Writing through the guard
//! marks the page dirty.

use std::ops::{Deref, DerefMut};

use tracing::warn;

use crate::common::{FrameId, PageId};
use crate::storage::page::Page;
use crate::storage::FileRef;

use super::buffer_manager::BufferManager;

/// A pinned page, unpinned on drop.
///
/// The guard borrows the manager mutably, so while it lives nothing else can
/// evict or dispose its page.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use clockpool::{BufferManager, FileRef, MemFile, PageId};
///
/// let file: FileRef = Arc::new(MemFile::with_pages(1));
/// let mut bpm = BufferManager::new(4);
///
/// {
///     let mut guard = bpm.fetch_guarded(&file, PageId::new(0))?;
///     guard.as_mut_slice()[0] = 0xFF; // DerefMut marks the page dirty
/// } // unpinned here
///
/// assert_eq!(bpm.pin_count(&file, PageId::new(0)), Some(0));
/// assert_eq!(bpm.is_dirty(&file, PageId::new(0)), Some(true));
/// # Ok::<(), clockpool::Error>(())
/// ```
pub struct PageGuard<'a> {
    /// Manager to unpin through on drop.
    bpm: &'a mut BufferManager,
    /// File the page belongs to.
    file: FileRef,
    /// Page number for convenience.
    page_no: PageId,
    /// Frame holding this page.
    frame_id: FrameId,
    /// Whether to mark the page dirty on release.
    dirty: bool,
}

impl<'a> PageGuard<'a> {
    /// Called by `BufferManager::fetch_guarded()` / `new_page_guarded()`
    /// after the page has been pinned.
    pub(crate) fn new(
        bpm: &'a mut BufferManager,
        file: FileRef,
        page_no: PageId,
        frame_id: FrameId,
    ) -> Self {
        Self {
            bpm,
            file,
            page_no,
            frame_id,
            dirty: false,
        }
    }

    #[inline]
    pub fn page_no(&self) -> PageId {
        self.page_no
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Mark the page dirty without writing through the guard.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl Deref for PageGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        self.bpm.slot(self.frame_id)
    }
}

impl DerefMut for PageGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Page {
        self.dirty = true;
        self.bpm.slot_mut(self.frame_id)
    }
}

impl Drop for PageGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.bpm.unpin_page(&self.file, self.page_no, self.dirty) {
            warn!(page = %self.page_no, error = %err, "page guard failed to unpin");
        }
    }
}

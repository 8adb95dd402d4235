//! Frame - one slot's descriptor in the buffer pool.
//!
//! A [`Frame`] records what the matching pool slot holds:
//! - Which file and page are loaded (if any)
//! - Pin count for reference counting
//! - Dirty flag for write-back tracking
//! - Reference bit for the clock sweep

use std::fmt;

use crate::common::{Error, FileId, FrameId, PageId, Result};
use crate::storage::FileRef;

/// Descriptor of a frame in the buffer pool.
///
/// The page bytes live in the pool's page array at the same index; a frame
/// only carries metadata. Frames are created once with the pool and are only
/// ever changed by the buffer manager, which owns them exclusively, so no
/// field needs interior mutability.
///
/// # Invariants
/// - `dirty` implies `valid`
/// - an empty frame has no file, `PageId::INVALID`, and no pins
pub struct Frame {
    /// Position in the pool. Never changes.
    frame_id: FrameId,

    /// File owning the cached page.
    file: Option<FileRef>,

    /// Page number within `file`, or `PageId::INVALID`.
    page_no: PageId,

    /// Whether the frame holds a cached page.
    valid: bool,

    /// Whether the cached bytes differ from the file's copy.
    dirty: bool,

    /// Second-chance bit for the clock sweep.
    ref_bit: bool,

    /// Number of outstanding pins.
    pin_count: u32,
}

impl Frame {
    /// Create a new empty frame.
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            file: None,
            page_no: PageId::INVALID,
            valid: false,
            dirty: false,
            ref_bit: false,
            pin_count: 0,
        }
    }

    /// Load `page_no` of `file` into this frame: valid, referenced, pinned
    /// once, clean.
    pub fn set(&mut self, file: FileRef, page_no: PageId) {
        self.file = Some(file);
        self.page_no = page_no;
        self.valid = true;
        self.dirty = false;
        self.ref_bit = true;
        self.pin_count = 1;
    }

    /// Reset the frame to empty state.
    pub fn clear(&mut self) {
        self.file = None;
        self.page_no = PageId::INVALID;
        self.valid = false;
        self.dirty = false;
        self.ref_bit = false;
        self.pin_count = 0;
    }

    // ========================================================================
    // Identity
    // ========================================================================

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// The owning file handle.
    #[inline]
    pub fn file(&self) -> Option<&FileRef> {
        self.file.as_ref()
    }

    /// Identity of the owning file.
    #[inline]
    pub fn file_id(&self) -> Option<FileId> {
        self.file.as_ref().map(FileId::of)
    }

    /// Whether this frame names `file_id` as its owner.
    #[inline]
    pub fn is_owned_by(&self, file_id: FileId) -> bool {
        self.file_id() == Some(file_id)
    }

    #[inline]
    pub fn page_no(&self) -> PageId {
        self.page_no
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    // ========================================================================
    // Pin count
    // ========================================================================

    /// Increment the pin count. Returns the new pin count.
    #[inline]
    pub fn pin(&mut self) -> u32 {
        self.pin_count += 1;
        self.pin_count
    }

    /// Decrement the pin count. Returns the new pin count.
    ///
    /// # Errors
    /// `Error::PageNotPinned` if the pin count is already 0.
    #[inline]
    pub fn unpin(&mut self) -> Result<u32> {
        if self.pin_count == 0 {
            return Err(Error::PageNotPinned(self.page_no));
        }
        self.pin_count -= 1;
        Ok(self.pin_count)
    }

    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }

    // ========================================================================
    // Dirty flag and reference bit
    // ========================================================================

    #[inline]
    pub fn mark_dirty(&mut self) {
        debug_assert!(self.valid, "dirty frame must be valid");
        self.dirty = true;
    }

    /// Clear the dirty flag after a successful write-back.
    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record an access.
    #[inline]
    pub fn touch(&mut self) {
        self.ref_bit = true;
    }

    /// Clear the reference bit. Returns whether it was set.
    #[inline]
    pub fn take_ref_bit(&mut self) -> bool {
        std::mem::replace(&mut self.ref_bit, false)
    }

    #[inline]
    pub fn ref_bit(&self) -> bool {
        self.ref_bit
    }

    // ========================================================================
    // Frame state queries
    // ========================================================================

    /// Check if the frame can be evicted.
    #[inline]
    pub fn is_evictable(&self) -> bool {
        self.valid && !self.is_pinned()
    }

    /// Drop validity but keep the owner, which no manager operation does.
    #[cfg(test)]
    pub(crate) fn force_invalid(&mut self) {
        self.valid = false;
        self.dirty = false;
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("frame_id", &self.frame_id)
            .field("file", &self.file_id())
            .field("page_no", &self.page_no)
            .field("valid", &self.valid)
            .field("dirty", &self.dirty)
            .field("ref_bit", &self.ref_bit)
            .field("pin_count", &self.pin_count)
            .finish()
    }
}

//! Buffer Manager - the core page caching layer.
//!
//! The [`BufferManager`] provides:
//! - Page caching between files and memory
//! - Pin-based reference counting
//! - Write-back of dirty pages on eviction, flush, and teardown
//! - Clock (second-chance) replacement

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::buffer::{BufferStats, ClockHand, Frame, PageGuard, PageTable};
use crate::common::config::{page_table_buckets, SWEEP_PASSES};
use crate::common::{Error, FileId, FrameId, PageId, Result};
use crate::storage::page::Page;
use crate::storage::FileRef;

/// Manages a fixed pool of frames caching pages from any number of files.
///
/// # Architecture
/// ```text
/// ┌────────────────────────────────────────────────────────────────┐
/// │                        BufferManager                           │
/// │  ┌──────────────────┐  ┌──────────────────────────────────┐    │
/// │  │    page_table    │  │        frames: Vec<Frame>        │    │
/// │  │(FileId, PageId)  │─▶│  [Frame0] [Frame1] [Frame2] ...  │    │
/// │  │    → FrameId     │  ├──────────────────────────────────┤    │
/// │  └──────────────────┘  │        pool: Vec<Page>           │    │
/// │  ┌──────────────────┐  │  [Page0]  [Page1]  [Page2]  ...  │    │
/// │  │    clock hand    │─▶└──────────────────────────────────┘    │
/// │  └──────────────────┘                                          │
/// └────────────────────────────────────────────────────────────────┘
/// ```
///
/// # Threading
/// None. Every mutating operation takes `&mut self` and runs to completion,
/// blocking only on file I/O. Callers that share a manager between threads
/// put the whole manager behind one lock (e.g. `parking_lot::Mutex`).
///
/// # Pinning
/// [`read_page`](Self::read_page) and [`alloc_page`](Self::alloc_page) each
/// add one pin, which the caller releases with
/// [`unpin_page`](Self::unpin_page). A pinned frame is never chosen for
/// eviction. [`fetch_guarded`](Self::fetch_guarded) wraps the pair in a
/// [`PageGuard`] that unpins on drop.
///
/// # Usage
/// ```
/// use std::sync::Arc;
/// use clockpool::{BufferManager, FileRef, MemFile, PageId};
///
/// let file: FileRef = Arc::new(MemFile::with_pages(4));
/// let mut bpm = BufferManager::new(2);
///
/// let page = bpm.read_page(&file, PageId::new(1))?;
/// page.as_mut_slice()[0] = 0xAB;
/// bpm.unpin_page(&file, PageId::new(1), true)?;
///
/// bpm.flush_file(&file)?;
/// # Ok::<(), clockpool::Error>(())
/// ```
pub struct BufferManager {
    /// Frame descriptors, one per pool slot.
    frames: Vec<Frame>,

    /// Page bytes, index-aligned with `frames`.
    pool: Vec<Page>,

    /// Maps cached (file, page) pairs to frames.
    page_table: PageTable,

    /// Replacement cursor; persists across allocations.
    clock: ClockHand,

    /// Performance statistics.
    stats: BufferStats,
}

impl BufferManager {
    /// Create a new buffer manager with `capacity` frames.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self::build(capacity)
    }

    /// Create a new buffer manager with `capacity` frames.
    ///
    /// # Errors
    /// `Error::InvalidCapacity` if `capacity` is 0.
    pub fn try_new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity);
        }
        Ok(Self::build(capacity))
    }

    fn build(capacity: usize) -> Self {
        let frames: Vec<Frame> = (0..capacity).map(|i| Frame::new(FrameId::new(i))).collect();
        let pool: Vec<Page> = (0..capacity).map(|_| Page::new()).collect();
        let page_table = PageTable::new(page_table_buckets(capacity));

        debug!(
            capacity,
            buckets = page_table.bucket_count(),
            "created buffer manager"
        );

        Self {
            frames,
            pool,
            page_table,
            clock: ClockHand::new(capacity),
            stats: BufferStats::default(),
        }
    }

    // ========================================================================
    // Public API: Fetch and release pages
    // ========================================================================

    /// Fetch `page_no` of `file`, pinned.
    ///
    /// On a hit the cached bytes are returned without I/O. On a miss a frame
    /// is allocated (possibly evicting another page) and the page is read
    /// from the file.
    ///
    /// The returned view is valid until the next call on the manager; use
    /// [`page`](Self::page) / [`page_mut`](Self::page_mut) to get it again
    /// while the pin is held.
    ///
    /// # Errors
    /// - `Error::BufferExceeded` if no frame can be freed
    /// - the file's error if the read fails (the frame stays empty)
    /// - `Error::PageTable` if the page table rejects the new entry
    pub fn read_page(&mut self, file: &FileRef, page_no: PageId) -> Result<&mut Page> {
        let file_id = FileId::of(file);

        if let Some(frame_id) = self.page_table.lookup(file_id, page_no) {
            let frame = &mut self.frames[frame_id.0];
            frame.touch();
            let pins = frame.pin();
            self.stats.cache_hits += 1;
            trace!(file = %file_id, page = %page_no, frame = %frame_id, pins, "buffer hit");
            return Ok(&mut self.pool[frame_id.0]);
        }

        self.stats.cache_misses += 1;
        debug!(file = %file_id, page = %page_no, "buffer miss, reading from file");

        let frame_id = self.alloc_buf()?;
        file.read_page(page_no, &mut self.pool[frame_id.0])?;
        self.stats.pages_read += 1;

        self.page_table.insert(file_id, page_no, frame_id)?;
        self.frames[frame_id.0].set(Arc::clone(file), page_no);

        Ok(&mut self.pool[frame_id.0])
    }

    /// Release one pin on `page_no` of `file`.
    ///
    /// If `dirty` is set the frame is marked dirty. The dirty flag is sticky:
    /// only a successful write-back clears it.
    ///
    /// # Errors
    /// - `Error::PageNotCached` if the page is not in the pool
    /// - `Error::PageNotPinned` if its pin count is already 0
    pub fn unpin_page(&mut self, file: &FileRef, page_no: PageId, dirty: bool) -> Result<()> {
        let frame_id = self
            .page_table
            .lookup(FileId::of(file), page_no)
            .ok_or(Error::PageNotCached(page_no))?;

        let frame = &mut self.frames[frame_id.0];
        let pins = frame.unpin()?;
        if dirty {
            frame.mark_dirty();
        }

        trace!(page = %page_no, frame = %frame_id, pins, dirty, "unpinned");
        Ok(())
    }

    // ========================================================================
    // Public API: Create and dispose pages
    // ========================================================================

    /// Allocate a new page in `file` and load it, pinned, into the pool.
    ///
    /// The frame starts zero-filled and clean.
    ///
    /// # Errors
    /// - the file's error if allocation fails (no frame is touched)
    /// - `Error::BufferExceeded` if no frame can be freed. The page stays
    ///   allocated in the file.
    pub fn alloc_page(&mut self, file: &FileRef) -> Result<(PageId, &mut Page)> {
        let file_id = FileId::of(file);
        let page_no = file.allocate_page()?;

        let frame_id = self.alloc_buf()?;
        self.page_table.insert(file_id, page_no, frame_id)?;
        self.frames[frame_id.0].set(Arc::clone(file), page_no);

        let page = &mut self.pool[frame_id.0];
        page.reset();

        debug!(file = %file_id, page = %page_no, frame = %frame_id, "allocated page");
        Ok((page_no, page))
    }

    /// Remove `page_no` from the pool and dispose of it in `file`.
    ///
    /// A cached copy is dropped whatever its pin count; callers must not
    /// dispose pages they still use. The outcome is the file's.
    pub fn dispose_page(&mut self, file: &FileRef, page_no: PageId) -> Result<()> {
        let file_id = FileId::of(file);

        if let Some(frame_id) = self.page_table.lookup(file_id, page_no) {
            let frame = &mut self.frames[frame_id.0];
            if frame.is_pinned() {
                warn!(page = %page_no, pins = frame.pin_count(), "disposing a pinned page");
            }
            frame.clear();
            self.page_table.remove(file_id, page_no)?;
        }

        debug!(file = %file_id, page = %page_no, "disposing page");
        file.dispose_page(page_no)
    }

    // ========================================================================
    // Public API: Flush pages
    // ========================================================================

    /// Write back and evict every page of `file`.
    ///
    /// Call this before closing a file so no cached copy outlives it.
    ///
    /// Frames are processed in order and the call stops at the first
    /// failure. Pages handled before that stay evicted.
    ///
    /// # Errors
    /// - `Error::PagePinned` if a page of the file is pinned
    /// - the file's error if a write-back fails
    /// - `Error::CorruptFrame` if a frame names the file but holds no page
    pub fn flush_file(&mut self, file: &FileRef) -> Result<()> {
        let file_id = FileId::of(file);

        for idx in 0..self.frames.len() {
            let frame = &self.frames[idx];
            if !frame.is_owned_by(file_id) {
                continue;
            }
            if !frame.is_valid() {
                return Err(Error::CorruptFrame(frame.frame_id()));
            }
            if frame.is_pinned() {
                return Err(Error::PagePinned(frame.page_no()));
            }

            let page_no = frame.page_no();
            if frame.is_dirty() {
                self.write_back(FrameId::new(idx))?;
            }

            self.page_table.remove(file_id, page_no)?;
            self.frames[idx].clear();
        }

        debug!(file = %file_id, "flushed file");
        Ok(())
    }

    /// Write back every dirty page without evicting anything.
    ///
    /// Stops at the first failed write.
    pub fn flush_all(&mut self) -> Result<()> {
        for idx in 0..self.frames.len() {
            if self.frames[idx].is_dirty() {
                self.write_back(FrameId::new(idx))?;
            }
        }
        Ok(())
    }

    /// Tear the manager down, writing back every dirty page.
    ///
    /// Same as dropping the manager, except the first write failure is
    /// returned instead of logged. Every dirty page is attempted either way.
    pub fn shutdown(mut self) -> Result<()> {
        let result = match self.write_back_dirty() {
            Some(err) => Err(err),
            None => Ok(()),
        };

        // Nothing left for Drop to retry.
        for frame in &mut self.frames {
            frame.clear();
        }
        self.page_table = PageTable::new(1);

        result
    }

    // ========================================================================
    // Public API: Page access and scoped pins
    // ========================================================================

    /// The cached bytes of `page_no`, without pinning.
    ///
    /// # Errors
    /// `Error::PageNotCached` if the page is not in the pool.
    pub fn page(&self, file: &FileRef, page_no: PageId) -> Result<&Page> {
        let frame_id = self.cached_frame(file, page_no)?;
        Ok(&self.pool[frame_id.0])
    }

    /// The cached bytes of `page_no` for writing, without pinning.
    ///
    /// Writing does not mark the page dirty; say so when unpinning.
    ///
    /// # Errors
    /// `Error::PageNotCached` if the page is not in the pool.
    pub fn page_mut(&mut self, file: &FileRef, page_no: PageId) -> Result<&mut Page> {
        let frame_id = self.cached_frame(file, page_no)?;
        Ok(&mut self.pool[frame_id.0])
    }

    /// Fetch `page_no` of `file` behind a guard that unpins it on drop.
    pub fn fetch_guarded(&mut self, file: &FileRef, page_no: PageId) -> Result<PageGuard<'_>> {
        self.read_page(file, page_no)?;
        let frame_id = self.cached_frame(file, page_no)?;
        Ok(PageGuard::new(self, Arc::clone(file), page_no, frame_id))
    }

    /// Allocate a new page in `file` behind a guard that unpins it on drop.
    pub fn new_page_guarded(&mut self, file: &FileRef) -> Result<PageGuard<'_>> {
        let page_no = self.alloc_page(file)?.0;
        let frame_id = self.cached_frame(file, page_no)?;
        Ok(PageGuard::new(self, Arc::clone(file), page_no, frame_id))
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    /// Number of frames in the pool.
    pub fn capacity(&self) -> usize {
        self.frames.len()
    }

    /// Number of pages currently cached.
    pub fn cached_pages(&self) -> usize {
        self.page_table.len()
    }

    /// Frame holding `page_no` of `file`, if cached.
    pub fn frame_of(&self, file: &FileRef, page_no: PageId) -> Option<FrameId> {
        self.page_table.lookup(FileId::of(file), page_no)
    }

    /// Pin count of a cached page.
    pub fn pin_count(&self, file: &FileRef, page_no: PageId) -> Option<u32> {
        self.frame_of(file, page_no)
            .map(|fid| self.frames[fid.0].pin_count())
    }

    /// Dirty flag of a cached page.
    pub fn is_dirty(&self, file: &FileRef, page_no: PageId) -> Option<bool> {
        self.frame_of(file, page_no)
            .map(|fid| self.frames[fid.0].is_dirty())
    }

    /// Read-only view of the frame table.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Get buffer statistics.
    pub fn stats(&self) -> BufferStats {
        self.stats
    }

    /// Zero the statistics counters.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Check that the frame table and page table agree.
    ///
    /// Every valid frame must have exactly one page-table entry pointing at
    /// it, no entry may point at an invalid frame, and no frame may be dirty
    /// without being valid.
    ///
    /// # Errors
    /// `Error::CorruptFrame` naming the first offending frame.
    pub fn check_consistency(&self) -> Result<()> {
        let mut targets = vec![0usize; self.frames.len()];

        for (file, page_no, frame_id) in self.page_table.iter() {
            let frame = &self.frames[frame_id.0];
            if !frame.is_valid() || frame.page_no() != page_no || !frame.is_owned_by(file) {
                return Err(Error::CorruptFrame(frame_id));
            }
            targets[frame_id.0] += 1;
        }

        for (frame, &count) in self.frames.iter().zip(&targets) {
            let expected = usize::from(frame.is_valid());
            if count != expected || (frame.is_dirty() && !frame.is_valid()) {
                return Err(Error::CorruptFrame(frame.frame_id()));
            }
        }
        Ok(())
    }

    /// Log the frame table at debug level, one event per line.
    pub fn print_self(&self) {
        for line in self.to_string().lines() {
            debug!("{}", line);
        }
    }

    // ========================================================================
    // Internal: Called by PageGuard
    // ========================================================================

    pub(crate) fn slot(&self, frame_id: FrameId) -> &Page {
        &self.pool[frame_id.0]
    }

    pub(crate) fn slot_mut(&mut self, frame_id: FrameId) -> &mut Page {
        &mut self.pool[frame_id.0]
    }

    // ========================================================================
    // Internal: Frame allocation and eviction
    // ========================================================================

    /// Pick a frame for a new page with the clock sweep.
    ///
    /// Empty frames are taken at once. A referenced frame loses its
    /// reference bit and is passed over. An unreferenced, unpinned frame is
    /// evicted (written back first if dirty) and taken. Pinned frames are
    /// skipped. Gives up after `SWEEP_PASSES` trips around the pool.
    fn alloc_buf(&mut self) -> Result<FrameId> {
        let limit = SWEEP_PASSES * self.frames.len();
        let mut steps = 0;

        while steps < limit {
            let frame_id = self.clock.advance();
            let frame = &mut self.frames[frame_id.0];

            if !frame.is_valid() {
                trace!(frame = %frame_id, "clock found empty frame");
                return Ok(frame_id);
            }

            if frame.take_ref_bit() {
                trace!(frame = %frame_id, "second chance");
            } else if frame.is_evictable() {
                self.evict(frame_id)?;
                return Ok(frame_id);
            }

            steps += 1;
        }

        debug!(steps, "no evictable frame");
        Err(Error::BufferExceeded)
    }

    /// Empty a valid, unpinned frame, writing it back first if dirty.
    ///
    /// A failed write leaves the frame as it was.
    fn evict(&mut self, frame_id: FrameId) -> Result<()> {
        let frame = &self.frames[frame_id.0];
        let file_id = frame.file_id().ok_or(Error::CorruptFrame(frame_id))?;
        let page_no = frame.page_no();

        if frame.is_dirty() {
            self.write_back(frame_id)?;
        }

        self.page_table.remove(file_id, page_no)?;
        self.frames[frame_id.0].clear();
        self.stats.evictions += 1;

        debug!(file = %file_id, page = %page_no, frame = %frame_id, "evicted page");
        Ok(())
    }

    /// Write a frame's bytes to its file and clear its dirty flag.
    fn write_back(&mut self, frame_id: FrameId) -> Result<()> {
        let frame = &self.frames[frame_id.0];
        let file = frame.file().ok_or(Error::CorruptFrame(frame_id))?;
        let page_no = frame.page_no();

        file.write_page(page_no, &self.pool[frame_id.0])?;

        self.frames[frame_id.0].clear_dirty();
        self.stats.pages_written += 1;
        debug!(page = %page_no, frame = %frame_id, "flushed page");
        Ok(())
    }

    /// Write back every valid dirty frame, pinned or not.
    ///
    /// Failures are logged and skipped; the first one is returned.
    fn write_back_dirty(&mut self) -> Option<Error> {
        let mut first_err = None;

        for idx in 0..self.frames.len() {
            let frame = &self.frames[idx];
            if !(frame.is_valid() && frame.is_dirty()) {
                continue;
            }
            if let Err(err) = self.write_back(FrameId::new(idx)) {
                warn!(frame = idx, error = %err, "write-back failed during teardown");
                first_err.get_or_insert(err);
            }
        }

        first_err
    }

    fn cached_frame(&self, file: &FileRef, page_no: PageId) -> Result<FrameId> {
        self.frame_of(file, page_no)
            .ok_or(Error::PageNotCached(page_no))
    }
}

impl Drop for BufferManager {
    fn drop(&mut self) {
        self.write_back_dirty();
    }
}

impl fmt::Display for BufferManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Print buffer...")?;
        for (frame, page) in self.frames.iter().zip(&self.pool) {
            write!(
                f,
                "{}\t{}\tpinCnt: {}",
                frame.frame_id().0,
                page.preview(32),
                frame.pin_count()
            )?;
            if frame.is_valid() {
                write!(f, "\tvalid\t{}", frame.page_no())?;
            }
            if frame.is_dirty() {
                write!(f, "\tdirty")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for BufferManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferManager")
            .field("capacity", &self.frames.len())
            .field("cached_pages", &self.page_table.len())
            .field("clock", &self.clock.current())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemFile;
    use tracing_test::traced_test;

    /// A memory file with `pages` pages, as both its concrete and shared handle.
    fn mem_file(pages: u32) -> (Arc<MemFile>, FileRef) {
        let mem = Arc::new(MemFile::with_pages(pages));
        let file: FileRef = mem.clone();
        (mem, file)
    }

    #[test]
    fn test_new() {
        let bpm = BufferManager::new(10);
        assert_eq!(bpm.capacity(), 10);
        assert_eq!(bpm.cached_pages(), 0);
        assert_eq!(bpm.page_table.bucket_count(), 13);
        // First advance lands on frame 0.
        assert_eq!(bpm.clock.current(), FrameId::new(9));
        assert!(bpm.frames.iter().all(|f| !f.is_valid()));
    }

    #[test]
    fn test_try_new_zero_capacity() {
        assert!(matches!(BufferManager::try_new(0), Err(Error::InvalidCapacity)));
    }

    #[test]
    #[should_panic(expected = "capacity must be > 0")]
    fn test_new_zero_capacity_panics() {
        BufferManager::new(0);
    }

    #[test]
    fn test_fill_in_frame_order() {
        let (_mem, file) = mem_file(5);
        let mut bpm = BufferManager::new(3);

        for i in 0..3 {
            bpm.read_page(&file, PageId::new(i)).unwrap();
            assert_eq!(bpm.frame_of(&file, PageId::new(i)), Some(FrameId::new(i as usize)));
        }
    }

    #[test]
    fn test_hit_does_no_io() {
        let (mem, file) = mem_file(2);
        let mut bpm = BufferManager::new(4);

        bpm.read_page(&file, PageId::new(1)).unwrap();
        bpm.read_page(&file, PageId::new(1)).unwrap();

        assert_eq!(mem.read_count(), 1);
        assert_eq!(bpm.pin_count(&file, PageId::new(1)), Some(2));
        let stats = bpm.stats();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
    }

    #[test]
    fn test_reset_stats() {
        let (_mem, file) = mem_file(2);
        let mut bpm = BufferManager::new(1);

        bpm.read_page(&file, PageId::new(0)).unwrap();
        bpm.unpin_page(&file, PageId::new(0), true).unwrap();
        bpm.read_page(&file, PageId::new(1)).unwrap();
        assert_eq!(bpm.stats().evictions, 1);

        bpm.reset_stats();
        assert_eq!(bpm.stats(), BufferStats::default());

        // Counting resumes from zero.
        bpm.read_page(&file, PageId::new(1)).unwrap();
        assert_eq!(bpm.stats().cache_hits, 1);
        assert_eq!(bpm.stats().pages_written, 0);
    }

    #[test]
    fn test_second_chance_skips_referenced_frame() {
        let (_mem, file) = mem_file(5);
        let mut bpm = BufferManager::new(2);

        for i in 0..2 {
            bpm.read_page(&file, PageId::new(i)).unwrap();
            bpm.unpin_page(&file, PageId::new(i), false).unwrap();
        }

        // Both referenced: the first pass clears both bits, the second
        // evicts frame 0.
        bpm.read_page(&file, PageId::new(2)).unwrap();
        assert_eq!(bpm.frame_of(&file, PageId::new(2)), Some(FrameId::new(0)));
        assert_eq!(bpm.frame_of(&file, PageId::new(0)), None);

        // Page 1 lost its bit in that sweep, so it goes next even though
        // page 2 was loaded later.
        bpm.unpin_page(&file, PageId::new(2), false).unwrap();
        bpm.read_page(&file, PageId::new(3)).unwrap();
        assert_eq!(bpm.frame_of(&file, PageId::new(3)), Some(FrameId::new(1)));
        assert!(bpm.frame_of(&file, PageId::new(2)).is_some());
    }

    #[test]
    #[traced_test]
    fn test_alloc_buf_bounded_sweep() {
        let (_mem, file) = mem_file(4);
        let mut bpm = BufferManager::new(3);

        for i in 0..3 {
            bpm.read_page(&file, PageId::new(i)).unwrap();
        }
        let hand_before = bpm.clock.current();

        let err = bpm.alloc_buf().unwrap_err();
        assert!(matches!(err, Error::BufferExceeded));

        // Gave up after exactly two passes over three frames.
        assert!(logs_contain("steps=6"));
        assert!(!logs_contain("steps=9"));
        assert_eq!(bpm.clock.current(), hand_before);
        // Reference bits were consumed by the first pass.
        assert!(bpm.frames.iter().all(|f| !f.ref_bit()));
    }

    #[test]
    fn test_clock_hand_persists_across_calls() {
        let (_mem, file) = mem_file(8);
        let mut bpm = BufferManager::new(4);

        bpm.read_page(&file, PageId::new(0)).unwrap();
        bpm.read_page(&file, PageId::new(1)).unwrap();
        assert_eq!(bpm.clock.current(), FrameId::new(1));

        bpm.alloc_page(&file).unwrap();
        assert_eq!(bpm.clock.current(), FrameId::new(2));
    }

    #[test]
    fn test_miss_read_failure_leaves_frame_empty() {
        let (mem, file) = mem_file(2);
        let mut bpm = BufferManager::new(2);

        mem.fail_reads(true);
        let err = bpm.read_page(&file, PageId::new(0)).unwrap_err();
        assert!(err.is_io());

        assert_eq!(bpm.cached_pages(), 0);
        assert!(bpm.frames.iter().all(|f| !f.is_valid()));
        bpm.check_consistency().unwrap();
    }

    #[test]
    fn test_read_missing_page_is_file_error() {
        let (_mem, file) = mem_file(1);
        let mut bpm = BufferManager::new(2);

        let err = bpm.read_page(&file, PageId::new(9)).unwrap_err();
        assert!(matches!(err, Error::InvalidPage(PageId(9))));
        assert_eq!(bpm.cached_pages(), 0);
    }

    #[test]
    fn test_eviction_write_failure_leaves_frame_untouched() {
        let (mem, file) = mem_file(3);
        let mut bpm = BufferManager::new(1);

        bpm.read_page(&file, PageId::new(0)).unwrap();
        bpm.unpin_page(&file, PageId::new(0), true).unwrap();

        mem.fail_writes(true);
        let err = bpm.read_page(&file, PageId::new(1)).unwrap_err();
        assert!(err.is_io());

        // Page 0 is still cached and still dirty.
        assert_eq!(bpm.frame_of(&file, PageId::new(0)), Some(FrameId::new(0)));
        assert_eq!(bpm.is_dirty(&file, PageId::new(0)), Some(true));
        bpm.check_consistency().unwrap();

        mem.fail_writes(false);
        bpm.read_page(&file, PageId::new(1)).unwrap();
        assert_eq!(mem.writes_of(PageId::new(0)), 1);
    }

    #[test]
    fn test_unpin_errors() {
        let (_mem, file) = mem_file(2);
        let mut bpm = BufferManager::new(2);

        assert!(matches!(
            bpm.unpin_page(&file, PageId::new(0), false),
            Err(Error::PageNotCached(_))
        ));

        bpm.read_page(&file, PageId::new(0)).unwrap();
        bpm.unpin_page(&file, PageId::new(0), false).unwrap();
        assert!(matches!(
            bpm.unpin_page(&file, PageId::new(0), true),
            Err(Error::PageNotPinned(_))
        ));
        // A rejected unpin doesn't mark the page dirty.
        assert_eq!(bpm.is_dirty(&file, PageId::new(0)), Some(false));
    }

    #[test]
    fn test_dirty_is_sticky() {
        let (_mem, file) = mem_file(1);
        let mut bpm = BufferManager::new(2);

        bpm.read_page(&file, PageId::new(0)).unwrap();
        bpm.read_page(&file, PageId::new(0)).unwrap();
        bpm.unpin_page(&file, PageId::new(0), true).unwrap();
        bpm.unpin_page(&file, PageId::new(0), false).unwrap();

        assert_eq!(bpm.is_dirty(&file, PageId::new(0)), Some(true));
    }

    #[test]
    fn test_alloc_page_zeroes_reused_frame() {
        let (mem, file) = mem_file(1);
        mem.put(PageId::new(0), b"stale").unwrap();
        let mut bpm = BufferManager::new(1);

        bpm.read_page(&file, PageId::new(0)).unwrap();
        bpm.unpin_page(&file, PageId::new(0), false).unwrap();

        let (page_no, page) = bpm.alloc_page(&file).unwrap();
        assert_eq!(page_no, PageId::new(1));
        assert!(page.as_slice().iter().all(|&b| b == 0));
        assert_eq!(bpm.pin_count(&file, page_no), Some(1));
        assert_eq!(bpm.is_dirty(&file, page_no), Some(false));
    }

    #[test]
    fn test_alloc_page_file_failure_touches_no_frame() {
        let (mem, file) = mem_file(0);
        let mut bpm = BufferManager::new(2);

        mem.fail_allocations(true);
        assert!(bpm.alloc_page(&file).unwrap_err().is_io());
        assert_eq!(bpm.clock.current(), FrameId::new(1));
        assert_eq!(bpm.cached_pages(), 0);
    }

    #[test]
    fn test_alloc_page_no_rollback_when_pool_full() {
        let (mem, file) = mem_file(1);
        let mut bpm = BufferManager::new(1);

        bpm.read_page(&file, PageId::new(0)).unwrap();

        let err = bpm.alloc_page(&file).unwrap_err();
        assert!(matches!(err, Error::BufferExceeded));
        // The file-level allocation stands.
        assert_eq!(mem.allocation_count(), 1);
        assert!(mem.contains(PageId::new(1)));
    }

    #[test]
    fn test_flush_file_only_touches_that_file() {
        let (mem_a, file_a) = mem_file(2);
        let (mem_b, file_b) = mem_file(2);
        let mut bpm = BufferManager::new(4);

        for file in [&file_a, &file_b] {
            bpm.read_page(file, PageId::new(0)).unwrap();
            bpm.unpin_page(file, PageId::new(0), true).unwrap();
        }

        bpm.flush_file(&file_a).unwrap();

        assert_eq!(mem_a.writes_of(PageId::new(0)), 1);
        assert_eq!(mem_b.write_count(), 0);
        assert_eq!(bpm.frame_of(&file_a, PageId::new(0)), None);
        assert!(bpm.frame_of(&file_b, PageId::new(0)).is_some());
        bpm.check_consistency().unwrap();
    }

    #[test]
    fn test_flush_file_clean_pages_not_written() {
        let (mem, file) = mem_file(3);
        let mut bpm = BufferManager::new(3);

        for i in 0..3 {
            bpm.read_page(&file, PageId::new(i)).unwrap();
            bpm.unpin_page(&file, PageId::new(i), i == 1).unwrap();
        }

        bpm.flush_file(&file).unwrap();

        assert_eq!(mem.write_log(), vec![PageId::new(1)]);
        assert_eq!(bpm.cached_pages(), 0);
    }

    #[test]
    fn test_flush_file_detects_corrupt_frame() {
        let (_mem, file) = mem_file(2);
        let mut bpm = BufferManager::new(2);

        bpm.read_page(&file, PageId::new(0)).unwrap();
        bpm.frames[0].force_invalid();

        let err = bpm.flush_file(&file).unwrap_err();
        assert!(matches!(err, Error::CorruptFrame(FrameId(0))));
        assert!(bpm.check_consistency().is_err());
    }

    #[test]
    fn test_flush_all_keeps_pages_cached() {
        let (mem, file) = mem_file(2);
        let mut bpm = BufferManager::new(2);

        bpm.read_page(&file, PageId::new(0)).unwrap();
        bpm.unpin_page(&file, PageId::new(0), true).unwrap();
        bpm.read_page(&file, PageId::new(1)).unwrap();

        bpm.flush_all().unwrap();

        assert_eq!(mem.write_log(), vec![PageId::new(0)]);
        assert_eq!(bpm.is_dirty(&file, PageId::new(0)), Some(false));
        assert_eq!(bpm.pin_count(&file, PageId::new(1)), Some(1));
        assert_eq!(bpm.cached_pages(), 2);
    }

    #[test]
    fn test_shutdown_reports_write_failure() {
        let (mem, file) = mem_file(2);
        let mut bpm = BufferManager::new(2);

        for i in 0..2 {
            bpm.read_page(&file, PageId::new(i)).unwrap();
            bpm.unpin_page(&file, PageId::new(i), true).unwrap();
        }

        mem.fail_writes(true);
        assert!(bpm.shutdown().unwrap_err().is_io());

        // Drop didn't retry after shutdown.
        mem.fail_writes(false);
        assert_eq!(mem.write_count(), 0);
    }

    #[test]
    fn test_page_access_without_pin() {
        let (_mem, file) = mem_file(1);
        let mut bpm = BufferManager::new(1);

        assert!(matches!(
            bpm.page(&file, PageId::new(0)),
            Err(Error::PageNotCached(_))
        ));

        bpm.read_page(&file, PageId::new(0)).unwrap();
        bpm.page_mut(&file, PageId::new(0)).unwrap().as_mut_slice()[0] = 9;

        assert_eq!(bpm.page(&file, PageId::new(0)).unwrap().as_slice()[0], 9);
        assert_eq!(bpm.pin_count(&file, PageId::new(0)), Some(1));
    }

    #[test]
    #[traced_test]
    fn test_print_self() {
        let (mem, file) = mem_file(2);
        mem.put(PageId::new(1), b"hello").unwrap();
        let mut bpm = BufferManager::new(2);

        bpm.read_page(&file, PageId::new(1)).unwrap();
        let table = bpm.to_string();
        assert!(table.starts_with("Print buffer..."));
        assert!(table.contains("0\thello\tpinCnt: 1\tvalid\tPage(1)"));
        assert!(table.contains("1\t\tpinCnt: 0\n"));

        bpm.print_self();
        assert!(logs_contain("pinCnt: 1"));
    }
}
